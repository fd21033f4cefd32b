use thiserror::Error;

use crate::events::MessageEvent;

/// Sentinel for "no pull request number seen yet" during the field scan.
/// Never a legitimate pull request number.
const UNSET_PULL_REQUEST: i64 = i64::MIN;

/// The extracted, validated change record: valid only when all three fields
/// are populated. Consumed immediately by the router to drive the GitHub
/// lookup and not retained afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaChange {
    pub organization: String,
    pub repository: String,
    pub pull_request: i64,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("bot ID is missing from message event")]
    MissingBotId,
    #[error("attachments are missing from message event")]
    MissingAttachments,
    #[error("too many attachments from message event: {count} > 1")]
    TooManyAttachments { count: usize },
    #[error("schema change event is missing author")]
    MissingAuthor,
    #[error("not enough tokens in ref value to parse pull request: {count} < 3")]
    RefTokenCount { count: usize },
    #[error("unable to convert pull request to number: {token}")]
    PullRequestParse { token: String },
    #[error("invalid commit value format: {value}")]
    CommitFormat { value: String },
    #[error("not enough tokens in commit value to parse repository: {count} < 5")]
    CommitTokenCount { count: usize },
    #[error("pull request number was not present in message event")]
    MissingPullRequest,
    #[error("organization was not present in message event")]
    MissingOrganization,
    #[error("repository was not present in message event")]
    MissingRepository,
}

/// Map one change-feed message to a [`SchemaChange`].
///
/// Pure function of its input. The validation order is part of the
/// contract: callers and tests key off the exact failure, so each step
/// short-circuits with its own variant. Fields are scanned in the order
/// the attachment gives them and repeated `ref`/`commit` titles are
/// last-wins.
pub fn extract_schema_change(message: &MessageEvent) -> Result<SchemaChange, ExtractionError> {
    if message.bot_id.is_empty() {
        return Err(ExtractionError::MissingBotId);
    }

    let attachment_count = message.attachments.len();
    if attachment_count == 0 {
        return Err(ExtractionError::MissingAttachments);
    }
    if attachment_count > 1 {
        return Err(ExtractionError::TooManyAttachments { count: attachment_count });
    }

    let attachment = &message.attachments[0];
    if attachment.author_name.is_empty() {
        return Err(ExtractionError::MissingAuthor);
    }

    let mut pull_request = UNSET_PULL_REQUEST;
    let mut organization = String::new();
    let mut repository = String::new();

    for field in &attachment.fields {
        match field.title.to_ascii_lowercase().as_str() {
            // e.g. "refs/pull/5291/merge" - the pull request number is the
            // third slash-token.
            "ref" => {
                let tokens: Vec<&str> = field.value.split('/').collect();
                if tokens.len() < 3 {
                    return Err(ExtractionError::RefTokenCount { count: tokens.len() });
                }
                pull_request = tokens[2].parse::<i64>().map_err(|_| {
                    ExtractionError::PullRequestParse { token: tokens[2].to_owned() }
                })?;
            }
            // e.g. "https://github.com/kong/team-koko-bot/commit/180edc|sha"
            // - organization and repository are the fourth and fifth
            // slash-tokens of the link half.
            "commit" => {
                let tokens: Vec<&str> = field.value.split('|').collect();
                if tokens.len() != 2 {
                    return Err(ExtractionError::CommitFormat { value: field.value.clone() });
                }
                let tokens: Vec<&str> = tokens[0].split('/').collect();
                if tokens.len() < 5 {
                    return Err(ExtractionError::CommitTokenCount { count: tokens.len() });
                }
                organization = tokens[3].to_owned();
                repository = tokens[4].to_owned();
            }
            _ => {}
        }
    }

    if pull_request == UNSET_PULL_REQUEST {
        return Err(ExtractionError::MissingPullRequest);
    }
    if organization.is_empty() {
        return Err(ExtractionError::MissingOrganization);
    }
    if repository.is_empty() {
        return Err(ExtractionError::MissingRepository);
    }

    Ok(SchemaChange { organization, repository, pull_request })
}

#[cfg(test)]
mod tests {
    use super::{extract_schema_change, ExtractionError, SchemaChange};
    use crate::events::{Attachment, AttachmentField, MessageEvent};

    fn field(title: &str, value: &str) -> AttachmentField {
        AttachmentField { title: title.to_owned(), value: value.to_owned() }
    }

    fn feed_message(fields: Vec<AttachmentField>) -> MessageEvent {
        MessageEvent {
            bot_id: "B-FEED".to_owned(),
            subtype: "bot_message".to_owned(),
            channel_id: "C-FEED".to_owned(),
            attachments: vec![Attachment {
                author_name: "team-koko-bot".to_owned(),
                fields,
            }],
            ..MessageEvent::default()
        }
    }

    fn complete_fields() -> Vec<AttachmentField> {
        vec![
            field("Ref", "refs/pull/5291/merge"),
            field("Commit", "https://github.com/kong/team-koko-bot/commit/180edc|sha"),
        ]
    }

    #[test]
    fn extracts_complete_schema_change() {
        let change = extract_schema_change(&feed_message(complete_fields())).expect("change");

        assert_eq!(
            change,
            SchemaChange {
                organization: "kong".to_owned(),
                repository: "team-koko-bot".to_owned(),
                pull_request: 5291,
            }
        );
    }

    #[test]
    fn extraction_is_idempotent() {
        let message = feed_message(complete_fields());
        let first = extract_schema_change(&message);
        let second = extract_schema_change(&message);
        assert_eq!(first, second);
    }

    #[test]
    fn field_titles_match_case_insensitively() {
        let change = extract_schema_change(&feed_message(vec![
            field("REF", "refs/pull/17/merge"),
            field("commit", "https://github.com/acme/widgets/commit/abc|sha"),
        ]))
        .expect("change");

        assert_eq!(change.organization, "acme");
        assert_eq!(change.repository, "widgets");
        assert_eq!(change.pull_request, 17);
    }

    #[test]
    fn repeated_fields_are_last_wins() {
        let mut fields = complete_fields();
        fields.push(field("Ref", "refs/pull/9000/merge"));

        let change = extract_schema_change(&feed_message(fields)).expect("change");
        assert_eq!(change.pull_request, 9000);
    }

    #[test]
    fn unknown_field_titles_are_ignored() {
        let mut fields = complete_fields();
        fields.push(field("Branch", "main"));

        assert!(extract_schema_change(&feed_message(fields)).is_ok());
    }

    #[test]
    fn missing_bot_id_fails_first() {
        let mut message = feed_message(vec![]);
        message.bot_id = String::new();

        assert_eq!(extract_schema_change(&message), Err(ExtractionError::MissingBotId));
    }

    #[test]
    fn zero_attachments_is_an_error() {
        let mut message = feed_message(vec![]);
        message.attachments.clear();

        assert_eq!(extract_schema_change(&message), Err(ExtractionError::MissingAttachments));
    }

    #[test]
    fn multiple_attachments_report_the_actual_count() {
        let mut message = feed_message(complete_fields());
        message.attachments.push(message.attachments[0].clone());
        message.attachments.push(message.attachments[0].clone());

        let error = extract_schema_change(&message).expect_err("error");
        assert_eq!(error, ExtractionError::TooManyAttachments { count: 3 });
        assert_eq!(error.to_string(), "too many attachments from message event: 3 > 1");
    }

    #[test]
    fn empty_author_is_an_error() {
        let mut message = feed_message(complete_fields());
        message.attachments[0].author_name = String::new();

        assert_eq!(extract_schema_change(&message), Err(ExtractionError::MissingAuthor));
    }

    #[test]
    fn short_ref_value_reports_token_count() {
        let message = feed_message(vec![field("Ref", "refs/pull")]);

        let error = extract_schema_change(&message).expect_err("error");
        assert_eq!(error, ExtractionError::RefTokenCount { count: 2 });
        assert_eq!(
            error.to_string(),
            "not enough tokens in ref value to parse pull request: 2 < 3"
        );
    }

    #[test]
    fn non_numeric_pull_request_reports_the_token() {
        let message = feed_message(vec![field("Ref", "refs/pull/abc/merge")]);

        assert_eq!(
            extract_schema_change(&message),
            Err(ExtractionError::PullRequestParse { token: "abc".to_owned() })
        );
    }

    #[test]
    fn commit_without_separator_is_a_format_error() {
        let message = feed_message(vec![
            field("Ref", "refs/pull/5291/merge"),
            field("Commit", "https://github.com/kong/team-koko-bot/commit/180edc"),
        ]);

        assert_eq!(
            extract_schema_change(&message),
            Err(ExtractionError::CommitFormat {
                value: "https://github.com/kong/team-koko-bot/commit/180edc".to_owned()
            })
        );
    }

    #[test]
    fn short_commit_link_reports_token_count() {
        let message = feed_message(vec![
            field("Ref", "refs/pull/5291/merge"),
            field("Commit", "https://github.com|sha"),
        ]);

        let error = extract_schema_change(&message).expect_err("error");
        assert_eq!(error, ExtractionError::CommitTokenCount { count: 3 });
        assert_eq!(
            error.to_string(),
            "not enough tokens in commit value to parse repository: 3 < 5"
        );
    }

    #[test]
    fn missing_ref_field_yields_missing_pull_request() {
        let message = feed_message(vec![field(
            "Commit",
            "https://github.com/kong/team-koko-bot/commit/180edc|sha",
        )]);

        assert_eq!(extract_schema_change(&message), Err(ExtractionError::MissingPullRequest));
    }

    #[test]
    fn missing_commit_field_yields_missing_organization() {
        let message = feed_message(vec![field("Ref", "refs/pull/5291/merge")]);

        assert_eq!(extract_schema_change(&message), Err(ExtractionError::MissingOrganization));
    }
}
