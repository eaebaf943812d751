//! Action identifiers and the typed action union.
//!
//! [`ActionId`] is the closed set of identifiers the planner may emit.
//! [`Action`] pairs each executable id with its typed configuration; the
//! executor builds one from a config map and runs it through a single
//! exhaustive `match`, so adding an id without a handler fails to compile.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ActionConfig;
use crate::error::{ActionError, Result};
use crate::platforms::{
    Handler, HandlerContext, Outcome, calendar, discord, docs, excel, github, gmail, http_request,
    jira, kubernetes, linkedin, notion, sheets, slack, supabase, telegram, twilio, vercel,
    whatsapp, x,
};

// ---------------------------------------------------------------------------
// ActionId
// ---------------------------------------------------------------------------

/// Every action identifier known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionId {
    HttpRequest,
    SlackSendMessage,
    SlackListChannels,
    DiscordSendMessage,
    TelegramSendMessage,
    NotionCreatePage,
    NotionQueryDb,
    NotionAppendText,
    GmailSendEmail,
    GmailListMessages,
    CalendarCreateEvent,
    CalendarGetEvents,
    DocsCreateDocument,
    SheetsAppendRow,
    SheetsReadRange,
    GithubCreateIssue,
    GithubCommentIssue,
    GithubListIssues,
    JiraCreateIssue,
    LinkedinCreatePost,
    XPostTweet,
    VercelListDeployments,
    VercelRedeploy,
    ExcelAppendRow,
    WhatsappSendMessage,
    TwilioSendSms,
    SupabaseInsertRow,
    SupabaseSelectRows,
    KubernetesScaleDeployment,
    /// Free-form instruction step; planner-only.
    GenericAction,
    /// Container lifecycle step; planner-only.
    DockerContainer,
}

impl ActionId {
    /// All identifiers, in registry order.
    pub const ALL: &'static [ActionId] = &[
        Self::HttpRequest,
        Self::SlackSendMessage,
        Self::SlackListChannels,
        Self::DiscordSendMessage,
        Self::TelegramSendMessage,
        Self::NotionCreatePage,
        Self::NotionQueryDb,
        Self::NotionAppendText,
        Self::GmailSendEmail,
        Self::GmailListMessages,
        Self::CalendarCreateEvent,
        Self::CalendarGetEvents,
        Self::DocsCreateDocument,
        Self::SheetsAppendRow,
        Self::SheetsReadRange,
        Self::GithubCreateIssue,
        Self::GithubCommentIssue,
        Self::GithubListIssues,
        Self::JiraCreateIssue,
        Self::LinkedinCreatePost,
        Self::XPostTweet,
        Self::VercelListDeployments,
        Self::VercelRedeploy,
        Self::ExcelAppendRow,
        Self::WhatsappSendMessage,
        Self::TwilioSendSms,
        Self::SupabaseInsertRow,
        Self::SupabaseSelectRows,
        Self::KubernetesScaleDeployment,
        Self::GenericAction,
        Self::DockerContainer,
    ];

    /// The wire identifier (`slack_send_message`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HttpRequest => "http_request",
            Self::SlackSendMessage => "slack_send_message",
            Self::SlackListChannels => "slack_list_channels",
            Self::DiscordSendMessage => "discord_send_message",
            Self::TelegramSendMessage => "telegram_send_message",
            Self::NotionCreatePage => "notion_create_page",
            Self::NotionQueryDb => "notion_query_db",
            Self::NotionAppendText => "notion_append_text",
            Self::GmailSendEmail => "gmail_send_email",
            Self::GmailListMessages => "gmail_list_messages",
            Self::CalendarCreateEvent => "calendar_create_event",
            Self::CalendarGetEvents => "calendar_get_events",
            Self::DocsCreateDocument => "docs_create_document",
            Self::SheetsAppendRow => "sheets_append_row",
            Self::SheetsReadRange => "sheets_read_range",
            Self::GithubCreateIssue => "github_create_issue",
            Self::GithubCommentIssue => "github_comment_issue",
            Self::GithubListIssues => "github_list_issues",
            Self::JiraCreateIssue => "jira_create_issue",
            Self::LinkedinCreatePost => "linkedin_create_post",
            Self::XPostTweet => "x_post_tweet",
            Self::VercelListDeployments => "vercel_list_deployments",
            Self::VercelRedeploy => "vercel_redeploy",
            Self::ExcelAppendRow => "excel_append_row",
            Self::WhatsappSendMessage => "whatsapp_send_message",
            Self::TwilioSendSms => "twilio_send_sms",
            Self::SupabaseInsertRow => "supabase_insert_row",
            Self::SupabaseSelectRows => "supabase_select_rows",
            Self::KubernetesScaleDeployment => "kubernetes_scale_deployment",
            Self::GenericAction => "generic_action",
            Self::DockerContainer => "docker_container",
        }
    }

    /// Whether a handler exists for this id.
    pub fn is_executable(self) -> bool {
        !matches!(self, Self::GenericAction | Self::DockerContainer)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionId {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| ActionError::NotImplemented {
                action: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// An executable action with its typed configuration.
#[derive(Debug, Clone)]
pub enum Action {
    HttpRequest(http_request::HttpRequest),
    SlackSendMessage(slack::SendMessage),
    SlackListChannels(slack::ListChannels),
    DiscordSendMessage(discord::SendMessage),
    TelegramSendMessage(telegram::SendMessage),
    NotionCreatePage(notion::CreatePage),
    NotionQueryDb(notion::QueryDatabase),
    NotionAppendText(notion::AppendText),
    GmailSendEmail(gmail::SendEmail),
    GmailListMessages(gmail::ListMessages),
    CalendarCreateEvent(calendar::CreateEvent),
    CalendarGetEvents(calendar::GetEvents),
    DocsCreateDocument(docs::CreateDocument),
    SheetsAppendRow(sheets::AppendRow),
    SheetsReadRange(sheets::ReadRange),
    GithubCreateIssue(github::CreateIssue),
    GithubCommentIssue(github::CommentIssue),
    GithubListIssues(github::ListIssues),
    JiraCreateIssue(jira::CreateIssue),
    LinkedinCreatePost(linkedin::CreatePost),
    XPostTweet(x::PostTweet),
    VercelListDeployments(vercel::ListDeployments),
    VercelRedeploy(vercel::Redeploy),
    ExcelAppendRow(excel::AppendRow),
    WhatsappSendMessage(whatsapp::SendMessage),
    TwilioSendSms(twilio::SendSms),
    SupabaseInsertRow(supabase::InsertRow),
    SupabaseSelectRows(supabase::SelectRows),
    KubernetesScaleDeployment(kubernetes::ScaleDeployment),
}

fn build<H: Handler>(config: &ActionConfig) -> Result<H> {
    H::parse(&config.fields(H::ID))
}

impl Action {
    /// Build the typed action for `id` from a flattened config.
    ///
    /// # Errors
    ///
    /// [`ActionError::NotImplemented`] for planner-only ids, or the
    /// handler's own parse error.
    pub fn parse(id: ActionId, config: &ActionConfig) -> Result<Self> {
        Ok(match id {
            ActionId::HttpRequest => Self::HttpRequest(build(config)?),
            ActionId::SlackSendMessage => Self::SlackSendMessage(build(config)?),
            ActionId::SlackListChannels => Self::SlackListChannels(build(config)?),
            ActionId::DiscordSendMessage => Self::DiscordSendMessage(build(config)?),
            ActionId::TelegramSendMessage => Self::TelegramSendMessage(build(config)?),
            ActionId::NotionCreatePage => Self::NotionCreatePage(build(config)?),
            ActionId::NotionQueryDb => Self::NotionQueryDb(build(config)?),
            ActionId::NotionAppendText => Self::NotionAppendText(build(config)?),
            ActionId::GmailSendEmail => Self::GmailSendEmail(build(config)?),
            ActionId::GmailListMessages => Self::GmailListMessages(build(config)?),
            ActionId::CalendarCreateEvent => Self::CalendarCreateEvent(build(config)?),
            ActionId::CalendarGetEvents => Self::CalendarGetEvents(build(config)?),
            ActionId::DocsCreateDocument => Self::DocsCreateDocument(build(config)?),
            ActionId::SheetsAppendRow => Self::SheetsAppendRow(build(config)?),
            ActionId::SheetsReadRange => Self::SheetsReadRange(build(config)?),
            ActionId::GithubCreateIssue => Self::GithubCreateIssue(build(config)?),
            ActionId::GithubCommentIssue => Self::GithubCommentIssue(build(config)?),
            ActionId::GithubListIssues => Self::GithubListIssues(build(config)?),
            ActionId::JiraCreateIssue => Self::JiraCreateIssue(build(config)?),
            ActionId::LinkedinCreatePost => Self::LinkedinCreatePost(build(config)?),
            ActionId::XPostTweet => Self::XPostTweet(build(config)?),
            ActionId::VercelListDeployments => Self::VercelListDeployments(build(config)?),
            ActionId::VercelRedeploy => Self::VercelRedeploy(build(config)?),
            ActionId::ExcelAppendRow => Self::ExcelAppendRow(build(config)?),
            ActionId::WhatsappSendMessage => Self::WhatsappSendMessage(build(config)?),
            ActionId::TwilioSendSms => Self::TwilioSendSms(build(config)?),
            ActionId::SupabaseInsertRow => Self::SupabaseInsertRow(build(config)?),
            ActionId::SupabaseSelectRows => Self::SupabaseSelectRows(build(config)?),
            ActionId::KubernetesScaleDeployment => {
                Self::KubernetesScaleDeployment(build(config)?)
            }
            ActionId::GenericAction | ActionId::DockerContainer => {
                return Err(ActionError::NotImplemented {
                    action: id.to_string(),
                });
            }
        })
    }

    /// Perform the action's remote call(s).
    pub async fn run(&self, ctx: &HandlerContext<'_>) -> Result<Outcome> {
        match self {
            Self::HttpRequest(a) => a.run(ctx).await,
            Self::SlackSendMessage(a) => a.run(ctx).await,
            Self::SlackListChannels(a) => a.run(ctx).await,
            Self::DiscordSendMessage(a) => a.run(ctx).await,
            Self::TelegramSendMessage(a) => a.run(ctx).await,
            Self::NotionCreatePage(a) => a.run(ctx).await,
            Self::NotionQueryDb(a) => a.run(ctx).await,
            Self::NotionAppendText(a) => a.run(ctx).await,
            Self::GmailSendEmail(a) => a.run(ctx).await,
            Self::GmailListMessages(a) => a.run(ctx).await,
            Self::CalendarCreateEvent(a) => a.run(ctx).await,
            Self::CalendarGetEvents(a) => a.run(ctx).await,
            Self::DocsCreateDocument(a) => a.run(ctx).await,
            Self::SheetsAppendRow(a) => a.run(ctx).await,
            Self::SheetsReadRange(a) => a.run(ctx).await,
            Self::GithubCreateIssue(a) => a.run(ctx).await,
            Self::GithubCommentIssue(a) => a.run(ctx).await,
            Self::GithubListIssues(a) => a.run(ctx).await,
            Self::JiraCreateIssue(a) => a.run(ctx).await,
            Self::LinkedinCreatePost(a) => a.run(ctx).await,
            Self::XPostTweet(a) => a.run(ctx).await,
            Self::VercelListDeployments(a) => a.run(ctx).await,
            Self::VercelRedeploy(a) => a.run(ctx).await,
            Self::ExcelAppendRow(a) => a.run(ctx).await,
            Self::WhatsappSendMessage(a) => a.run(ctx).await,
            Self::TwilioSendSms(a) => a.run(ctx).await,
            Self::SupabaseInsertRow(a) => a.run(ctx).await,
            Self::SupabaseSelectRows(a) => a.run(ctx).await,
            Self::KubernetesScaleDeployment(a) => a.run(ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_round_trip_through_strings() {
        for id in ActionId::ALL {
            assert_eq!(id.as_str().parse::<ActionId>().unwrap(), *id);
            assert_eq!(
                serde_json::to_value(id).unwrap(),
                json!(id.as_str()),
                "serde name differs for {id}"
            );
        }
    }

    #[test]
    fn unknown_id_is_not_implemented() {
        let err = "teleport_user".parse::<ActionId>().unwrap_err();
        assert!(matches!(err, ActionError::NotImplemented { ref action } if action == "teleport_user"));
    }

    #[test]
    fn planner_only_ids_do_not_parse_into_actions() {
        let config = ActionConfig::from_value(json!({"instruction": "do it"}));
        for id in [ActionId::GenericAction, ActionId::DockerContainer] {
            assert!(!id.is_executable());
            assert!(matches!(
                Action::parse(id, &config),
                Err(ActionError::NotImplemented { .. })
            ));
        }
    }

    #[test]
    fn typed_parse_reports_bad_values() {
        let config = ActionConfig::from_value(json!({
            "repo": "octo/hello",
            "issue_number": "not-a-number",
            "body": "hi"
        }));
        let err = Action::parse(ActionId::GithubCommentIssue, &config).unwrap_err();
        assert!(matches!(err, ActionError::InvalidConfig { .. }));
    }
}
