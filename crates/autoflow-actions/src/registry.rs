//! Static action catalog.
//!
//! One [`ActionDefinition`] per [`ActionId`]: the platform it belongs to,
//! the credential keys it resolves, and the configuration fields it takes.
//! The planner reads it to describe available actions; the executor reads
//! it to validate required fields before dispatch.

use serde::Serialize;

use crate::action::ActionId;
use crate::config::ActionConfig;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input widget type for a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Textarea,
    Select,
    Number,
}

/// One configuration field of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "no_options")]
    pub options: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    pub required: bool,
}

fn no_options(options: &&'static [&'static str]) -> bool {
    options.is_empty()
}

impl FieldSpec {
    const fn new(key: &'static str, label: &'static str, field_type: FieldType) -> Self {
        Self {
            key,
            label,
            field_type,
            options: &[],
            placeholder: None,
            required: false,
        }
    }

    const fn text(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldType::Text)
    }

    const fn textarea(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldType::Textarea)
    }

    const fn number(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldType::Number)
    }

    const fn select(
        key: &'static str,
        label: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        let mut spec = Self::new(key, label, FieldType::Select);
        spec.options = options;
        spec
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn hint(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }
}

/// Catalog entry for one action.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ActionDefinition {
    pub id: ActionId,
    pub platform: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub credential_keys: &'static [&'static str],
    pub fields: &'static [FieldSpec],
}

impl ActionDefinition {
    /// Required fields absent (or blank) in `config`, in declaration order.
    pub fn missing_fields(&self, config: &ActionConfig) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.required && !config.is_present(f.key))
            .map(|f| f.key.to_string())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Every catalog entry, in [`ActionId::ALL`] order.
pub fn all() -> &'static [ActionDefinition] {
    CATALOG
}

/// Definition for a typed id.
pub fn definition(id: ActionId) -> Option<&'static ActionDefinition> {
    CATALOG.iter().find(|d| d.id == id)
}

/// Definition for a wire id, if it is known.
pub fn lookup(action_id: &str) -> Option<&'static ActionDefinition> {
    action_id
        .parse::<ActionId>()
        .ok()
        .and_then(definition)
}

/// Entries belonging to `platform` (case-insensitive).
pub fn by_platform(platform: &str) -> impl Iterator<Item = &'static ActionDefinition> + '_ {
    CATALOG
        .iter()
        .filter(move |d| d.platform.eq_ignore_ascii_case(platform))
}

/// Distinct platform names, in catalog order.
pub fn platforms() -> Vec<&'static str> {
    let mut seen: Vec<&'static str> = Vec::new();
    for def in CATALOG {
        if !seen.contains(&def.platform) {
            seen.push(def.platform);
        }
    }
    seen
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];

static CATALOG: &[ActionDefinition] = &[
    ActionDefinition {
        id: ActionId::HttpRequest,
        platform: "HTTP",
        display_name: "HTTP Request",
        description: "Make a generic HTTP request",
        credential_keys: &[],
        fields: &[
            FieldSpec::text("url", "URL").required().hint("https://api.example.com"),
            FieldSpec::select("method", "Method", HTTP_METHODS),
            FieldSpec::textarea("headers", "Headers (JSON)").hint(r#"{"Authorization": "Bearer..."}"#),
            FieldSpec::textarea("body", "Body (JSON)"),
        ],
    },
    ActionDefinition {
        id: ActionId::SlackSendMessage,
        platform: "Slack",
        display_name: "Send Slack Message",
        description: "Post a message to a Slack channel",
        credential_keys: &["SLACK_BOT_TOKEN"],
        fields: &[
            FieldSpec::text("channel", "Channel").required().hint("#general"),
            FieldSpec::textarea("text", "Message").required(),
        ],
    },
    ActionDefinition {
        id: ActionId::SlackListChannels,
        platform: "Slack",
        display_name: "List Slack Channels",
        description: "List channels visible to the bot",
        credential_keys: &["SLACK_BOT_TOKEN"],
        fields: &[
            FieldSpec::number("limit", "Limit").hint("100"),
            FieldSpec::text("types", "Channel Types").hint("public_channel,private_channel"),
        ],
    },
    ActionDefinition {
        id: ActionId::DiscordSendMessage,
        platform: "Discord",
        display_name: "Send Discord Message",
        description: "Post a message through a Discord webhook",
        credential_keys: &["DISCORD_WEBHOOK_URL"],
        fields: &[
            FieldSpec::textarea("content", "Message").required(),
            FieldSpec::text("username", "Display Name"),
        ],
    },
    ActionDefinition {
        id: ActionId::TelegramSendMessage,
        platform: "Telegram",
        display_name: "Send Telegram Message",
        description: "Send a message from a Telegram bot",
        credential_keys: &["TELEGRAM_BOT_TOKEN"],
        fields: &[
            FieldSpec::text("chat_id", "Chat ID").required(),
            FieldSpec::textarea("text", "Message").required(),
            FieldSpec::select("parse_mode", "Parse Mode", &["Markdown", "MarkdownV2", "HTML"]),
        ],
    },
    ActionDefinition {
        id: ActionId::NotionCreatePage,
        platform: "Notion",
        display_name: "Create Notion Page",
        description: "Create a page in a Notion database",
        credential_keys: &["NOTION_API_KEY"],
        fields: &[
            FieldSpec::text("database_id", "Database ID").required(),
            FieldSpec::textarea("properties", "Properties (JSON)"),
        ],
    },
    ActionDefinition {
        id: ActionId::NotionQueryDb,
        platform: "Notion",
        display_name: "Query Notion Database",
        description: "Query a Notion database with an optional filter",
        credential_keys: &["NOTION_API_KEY"],
        fields: &[
            FieldSpec::text("database_id", "Database ID").required(),
            FieldSpec::textarea("filter", "Filter (JSON)"),
        ],
    },
    ActionDefinition {
        id: ActionId::NotionAppendText,
        platform: "Notion",
        display_name: "Append to Notion Page",
        description: "Append paragraphs of text to a Notion page",
        credential_keys: &["NOTION_API_KEY"],
        fields: &[
            FieldSpec::text("page_id", "Page ID").required(),
            FieldSpec::textarea("content", "Content").required(),
        ],
    },
    ActionDefinition {
        id: ActionId::GmailSendEmail,
        platform: "Gmail",
        display_name: "Send Email",
        description: "Send a plain-text email from the connected Gmail account",
        credential_keys: &["GOOGLE_ACCESS_TOKEN"],
        fields: &[
            FieldSpec::text("to", "To").required().hint("recipient@example.com"),
            FieldSpec::text("subject", "Subject").required(),
            FieldSpec::textarea("body", "Body").required(),
        ],
    },
    ActionDefinition {
        id: ActionId::GmailListMessages,
        platform: "Gmail",
        display_name: "List Emails",
        description: "List messages matching a Gmail search query",
        credential_keys: &["GOOGLE_ACCESS_TOKEN"],
        fields: &[
            FieldSpec::text("query", "Search Query").hint("is:unread from:boss@example.com"),
            FieldSpec::number("max_results", "Max Results").hint("10"),
        ],
    },
    ActionDefinition {
        id: ActionId::CalendarCreateEvent,
        platform: "Google Calendar",
        display_name: "Create Calendar Event",
        description: "Create an event on the primary calendar",
        credential_keys: &["GOOGLE_ACCESS_TOKEN"],
        fields: &[
            FieldSpec::text("summary", "Event Title").required().hint("Meeting with..."),
            FieldSpec::textarea("description", "Description"),
            FieldSpec::text("start_time", "Start Time").required().hint("2024-01-01T10:00:00Z"),
            FieldSpec::text("end_time", "End Time").hint("defaults to one hour after start"),
            FieldSpec::text("attendees", "Attendees (Emails)").hint("a@b.com, c@d.com"),
        ],
    },
    ActionDefinition {
        id: ActionId::CalendarGetEvents,
        platform: "Google Calendar",
        display_name: "Get Calendar Events",
        description: "List upcoming events on the primary calendar",
        credential_keys: &["GOOGLE_ACCESS_TOKEN"],
        fields: &[
            FieldSpec::text("time_min", "From").hint("defaults to now"),
            FieldSpec::number("max_results", "Max Results").hint("10"),
        ],
    },
    ActionDefinition {
        id: ActionId::DocsCreateDocument,
        platform: "Google Docs",
        display_name: "Create Document",
        description: "Create a Google Doc, optionally with initial content",
        credential_keys: &["GOOGLE_ACCESS_TOKEN"],
        fields: &[
            FieldSpec::text("title", "Document Title").required(),
            FieldSpec::textarea("content", "Content"),
        ],
    },
    ActionDefinition {
        id: ActionId::SheetsAppendRow,
        platform: "Google Sheets",
        display_name: "Append Row",
        description: "Append a row of values to a sheet range",
        credential_keys: &["GOOGLE_ACCESS_TOKEN"],
        fields: &[
            FieldSpec::text("spreadsheet_id", "Spreadsheet ID").required(),
            FieldSpec::text("range", "Range").required().hint("Sheet1!A:D"),
            FieldSpec::textarea("values", "Values").required().hint("a, b, c or [\"a\", 1]"),
        ],
    },
    ActionDefinition {
        id: ActionId::SheetsReadRange,
        platform: "Google Sheets",
        display_name: "Read Range",
        description: "Read the values in a sheet range",
        credential_keys: &["GOOGLE_ACCESS_TOKEN"],
        fields: &[
            FieldSpec::text("spreadsheet_id", "Spreadsheet ID").required(),
            FieldSpec::text("range", "Range").required().hint("Sheet1!A1:D20"),
        ],
    },
    ActionDefinition {
        id: ActionId::GithubCreateIssue,
        platform: "GitHub",
        display_name: "Create Issue",
        description: "Open an issue in a repository",
        credential_keys: &["GITHUB_TOKEN"],
        fields: &[
            FieldSpec::text("repo", "Repository").required().hint("owner/repo"),
            FieldSpec::text("title", "Title").required(),
            FieldSpec::textarea("body", "Body"),
            FieldSpec::text("labels", "Labels").hint("bug, triage"),
        ],
    },
    ActionDefinition {
        id: ActionId::GithubCommentIssue,
        platform: "GitHub",
        display_name: "Comment on Issue",
        description: "Add a comment to an issue or pull request",
        credential_keys: &["GITHUB_TOKEN"],
        fields: &[
            FieldSpec::text("repo", "Repository").required().hint("owner/repo"),
            FieldSpec::number("issue_number", "Issue Number").required(),
            FieldSpec::textarea("body", "Comment").required(),
        ],
    },
    ActionDefinition {
        id: ActionId::GithubListIssues,
        platform: "GitHub",
        display_name: "List Issues",
        description: "List issues in a repository",
        credential_keys: &["GITHUB_TOKEN"],
        fields: &[
            FieldSpec::text("repo", "Repository").required().hint("owner/repo"),
            FieldSpec::select("state", "State", &["open", "closed", "all"]),
            FieldSpec::number("per_page", "Per Page").hint("30"),
        ],
    },
    ActionDefinition {
        id: ActionId::JiraCreateIssue,
        platform: "Jira",
        display_name: "Create Jira Issue",
        description: "Create an issue in a Jira Cloud project",
        credential_keys: &["JIRA_ACCESS_TOKEN", "JIRA_CLOUD_ID"],
        fields: &[
            FieldSpec::text("project_key", "Project Key").required().hint("OPS"),
            FieldSpec::text("summary", "Summary").required(),
            FieldSpec::textarea("description", "Description"),
            FieldSpec::select("issue_type", "Issue Type", &["Task", "Bug", "Story"]),
        ],
    },
    ActionDefinition {
        id: ActionId::LinkedinCreatePost,
        platform: "LinkedIn",
        display_name: "Create Post",
        description: "Share a text post on LinkedIn",
        credential_keys: &["LINKEDIN_ACCESS_TOKEN"],
        fields: &[
            FieldSpec::text("author", "Author URN").required().hint("urn:li:person:abc123"),
            FieldSpec::textarea("content", "Post Content").required(),
            FieldSpec::select("visibility", "Visibility", &["public", "connections"]),
        ],
    },
    ActionDefinition {
        id: ActionId::XPostTweet,
        platform: "X",
        display_name: "Post Tweet",
        description: "Publish a post on X",
        credential_keys: &["X_ACCESS_TOKEN"],
        fields: &[FieldSpec::textarea("text", "Text").required()],
    },
    ActionDefinition {
        id: ActionId::VercelListDeployments,
        platform: "Vercel",
        display_name: "List Deployments",
        description: "List recent deployments",
        credential_keys: &["VERCEL_TOKEN"],
        fields: &[
            FieldSpec::text("project_id", "Project ID"),
            FieldSpec::text("team_id", "Team ID"),
            FieldSpec::number("limit", "Limit").hint("10"),
        ],
    },
    ActionDefinition {
        id: ActionId::VercelRedeploy,
        platform: "Vercel",
        display_name: "Redeploy",
        description: "Create a new deployment from an existing one",
        credential_keys: &["VERCEL_TOKEN"],
        fields: &[
            FieldSpec::text("project_name", "Project Name").required(),
            FieldSpec::text("deployment_id", "Deployment ID").required(),
            FieldSpec::select("target", "Target", &["production", "preview"]),
            FieldSpec::text("team_id", "Team ID"),
        ],
    },
    ActionDefinition {
        id: ActionId::ExcelAppendRow,
        platform: "Microsoft Excel",
        display_name: "Append Table Row",
        description: "Add a row to a table in an Excel workbook on OneDrive",
        credential_keys: &["MICROSOFT_ACCESS_TOKEN"],
        fields: &[
            FieldSpec::text("item_id", "Workbook Item ID").required(),
            FieldSpec::text("table", "Table Name").required().hint("Table1"),
            FieldSpec::textarea("values", "Values").required(),
        ],
    },
    ActionDefinition {
        id: ActionId::WhatsappSendMessage,
        platform: "WhatsApp",
        display_name: "Send WhatsApp Message",
        description: "Send a text message through the WhatsApp Cloud API",
        credential_keys: &["WHATSAPP_ACCESS_TOKEN", "WHATSAPP_PHONE_NUMBER_ID"],
        fields: &[
            FieldSpec::text("to", "Recipient Phone").required().hint("15551234567"),
            FieldSpec::textarea("text", "Message").required(),
        ],
    },
    ActionDefinition {
        id: ActionId::TwilioSendSms,
        platform: "Twilio",
        display_name: "Send SMS",
        description: "Send an SMS through Twilio",
        credential_keys: &["TWILIO_ACCOUNT_SID", "TWILIO_AUTH_TOKEN"],
        fields: &[
            FieldSpec::text("to", "To").required().hint("+15551234567"),
            FieldSpec::text("from", "From").required().hint("+15557654321"),
            FieldSpec::textarea("body", "Message").required(),
        ],
    },
    ActionDefinition {
        id: ActionId::SupabaseInsertRow,
        platform: "Supabase",
        display_name: "Insert Row",
        description: "Insert one or more rows into a table",
        credential_keys: &["SUPABASE_URL", "SUPABASE_SERVICE_KEY"],
        fields: &[
            FieldSpec::text("table", "Table").required(),
            FieldSpec::textarea("row", "Row (JSON)").required().hint(r#"{"name": "Ada"}"#),
        ],
    },
    ActionDefinition {
        id: ActionId::SupabaseSelectRows,
        platform: "Supabase",
        display_name: "Select Rows",
        description: "Read rows from a table with PostgREST filters",
        credential_keys: &["SUPABASE_URL", "SUPABASE_SERVICE_KEY"],
        fields: &[
            FieldSpec::text("table", "Table").required(),
            FieldSpec::text("select", "Columns").hint("*"),
            FieldSpec::text("filter", "Filter").hint("status=eq.active"),
            FieldSpec::number("limit", "Limit"),
        ],
    },
    ActionDefinition {
        id: ActionId::KubernetesScaleDeployment,
        platform: "Kubernetes",
        display_name: "Scale Deployment",
        description: "Set the replica count of a deployment",
        credential_keys: &["KUBERNETES_API_URL", "KUBERNETES_TOKEN"],
        fields: &[
            FieldSpec::text("deployment", "Deployment Name").required(),
            FieldSpec::text("namespace", "Namespace").hint("default"),
            FieldSpec::number("replicas", "Replicas").required(),
        ],
    },
    ActionDefinition {
        id: ActionId::GenericAction,
        platform: "Generic",
        display_name: "Action",
        description: "Execute a script or action",
        credential_keys: &[],
        fields: &[FieldSpec::textarea("instruction", "Instruction").hint("Describe what to do...")],
    },
    ActionDefinition {
        id: ActionId::DockerContainer,
        platform: "Docker",
        display_name: "Manage Container",
        description: "Manage containers and images",
        credential_keys: &[],
        fields: &[
            FieldSpec::text("image", "Image Name"),
            FieldSpec::text("container_name", "Container Name"),
            FieldSpec::select("action", "Action", &["start", "stop", "restart", "logs"]),
        ],
    },
];
