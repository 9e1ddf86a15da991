//! Which actions a viewer may take on a piece of content.
//!
//! Capabilities come from role and reputation; the object's state then
//! removes actions that make no sense (closing a closed question, pinning a
//! hidden one). Ownership always grants edit and delete.

use agora_common::{AppError, AppResult, ObjectKind};
use agora_db::entities::question::{ContentStatus, PinState, ShowState};
use serde::Serialize;

use super::site_info::SiteInfoService;
use super::site_sections::{PrivilegeThresholds, SitePrivileges};
use crate::context::RequestContext;
use crate::i18n::Translator;

/// Privilege flags of one viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub edit: bool,
    pub delete: bool,
    pub close: bool,
    pub reopen: bool,
    pub pin: bool,
    pub unpin: bool,
    pub hide: bool,
    pub show: bool,
}

impl Capabilities {
    /// Every flag set.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            edit: true,
            delete: true,
            close: true,
            reopen: true,
            pin: true,
            unpin: true,
            hide: true,
            show: true,
        }
    }

    /// Flags earned by reputation alone.
    #[must_use]
    pub const fn for_rank(rank: i32, thresholds: &PrivilegeThresholds) -> Self {
        Self {
            edit: rank >= thresholds.edit,
            delete: rank >= thresholds.delete,
            close: rank >= thresholds.close,
            reopen: rank >= thresholds.reopen,
            pin: false,
            unpin: false,
            hide: false,
            show: false,
        }
    }
}

/// An action offered on a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectAction {
    Report,
    Edit,
    Close,
    Reopen,
    Pin,
    Unpin,
    Hide,
    Show,
    Delete,
}

impl ObjectAction {
    /// Display order.
    pub const ORDER: [Self; 9] = [
        Self::Report,
        Self::Edit,
        Self::Close,
        Self::Reopen,
        Self::Pin,
        Self::Unpin,
        Self::Hide,
        Self::Show,
        Self::Delete,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Report => "report",
            Self::Edit => "edit",
            Self::Close => "close",
            Self::Reopen => "reopen",
            Self::Pin => "pin",
            Self::Unpin => "unpin",
            Self::Hide => "hide",
            Self::Show => "show",
            Self::Delete => "delete",
        }
    }

    /// How the client should confirm the action.
    #[must_use]
    pub const fn kind(self) -> &'static str {
        match self {
            Self::Report => "reason",
            Self::Edit => "edit",
            _ => "confirm",
        }
    }
}

/// An action as sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionAction {
    pub action: ObjectAction,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// State of a question relevant to its actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionState {
    pub status: ContentStatus,
    pub pin: PinState,
    pub show: ShowState,
}

/// Everything needed to compute the actions on one object.
#[derive(Debug, Clone, Copy)]
pub struct ActionInput<'a> {
    pub kind: ObjectKind,
    pub viewer_id: Option<&'a str>,
    pub owner_id: &'a str,
    pub capabilities: Capabilities,
    /// Only set for questions.
    pub question: Option<QuestionState>,
}

/// Actions available to the viewer, in display order.
#[must_use]
pub fn object_actions(input: &ActionInput<'_>) -> Vec<ObjectAction> {
    let caps = input.capabilities;
    let is_owner = input.viewer_id == Some(input.owner_id);
    let authenticated = input.viewer_id.is_some();

    let allowed = |action: ObjectAction| -> bool {
        match action {
            ObjectAction::Report => authenticated,
            ObjectAction::Edit => is_owner || caps.edit,
            ObjectAction::Delete => is_owner || caps.delete,
            _ => input.question.is_some_and(|state| question_gate(action, caps, state)),
        }
    };

    ObjectAction::ORDER
        .into_iter()
        .filter(|action| allowed(*action))
        .collect()
}

fn question_gate(action: ObjectAction, caps: Capabilities, state: QuestionState) -> bool {
    let closed = state.status == ContentStatus::Closed;
    let pinned = state.pin == PinState::Pinned;
    let hidden = state.show == ShowState::Hidden;
    match action {
        ObjectAction::Close => caps.close && !closed,
        ObjectAction::Reopen => caps.reopen && closed,
        ObjectAction::Pin => caps.pin && !pinned && !hidden,
        ObjectAction::Unpin => caps.unpin && pinned,
        ObjectAction::Hide => caps.hide && !pinned && !hidden,
        ObjectAction::Show => caps.show && hidden,
        ObjectAction::Report | ObjectAction::Edit | ObjectAction::Delete => false,
    }
}

/// Attach translated names to actions.
#[must_use]
pub fn describe_actions(
    actions: &[ObjectAction],
    translator: &Translator,
    language: &str,
) -> Vec<PermissionAction> {
    actions
        .iter()
        .map(|action| PermissionAction {
            action: *action,
            name: translator.tr(language, &format!("action.{}", action.as_str())),
            kind: action.kind(),
        })
        .collect()
}

/// Whether a deleted object may still be shown to the viewer.
#[must_use]
pub const fn can_view_deleted(is_owner: bool, capabilities: &Capabilities) -> bool {
    is_owner || capabilities.reopen
}

/// Fail with `Forbidden` unless `action` is offered.
pub fn ensure_action(input: &ActionInput<'_>, action: ObjectAction) -> AppResult<()> {
    if object_actions(input).contains(&action) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "{} is not allowed on this {}",
            action.as_str(),
            input.kind
        )))
    }
}

/// Resolves capability flags from role and reputation.
#[derive(Clone)]
pub struct PrivilegeResolver {
    site_info: SiteInfoService,
}

impl PrivilegeResolver {
    #[must_use]
    pub const fn new(site_info: SiteInfoService) -> Self {
        Self { site_info }
    }

    /// Capabilities of the caller.
    pub async fn capabilities(&self, ctx: &RequestContext) -> AppResult<Capabilities> {
        if !ctx.is_authenticated() {
            return Ok(Capabilities::default());
        }
        if ctx.is_staff() {
            return Ok(Capabilities::all());
        }
        let privileges: SitePrivileges = self.site_info.get_section().await?;
        Ok(Capabilities::for_rank(ctx.rank, &privileges.thresholds()))
    }
}
