//! Operator alerting: best-effort crash/shutdown DMs to a fixed account.

use chrono::Local;

use crate::{domain::UserId, messaging::port::ChatPort};

/// Detail text is clipped so the DM stays under the platform limit.
const ALERT_DETAIL_MAX: usize = 1800;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertKind {
    FatalError,
    TaskFailure,
    Shutdown,
}

impl AlertKind {
    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::FatalError => "Fatal Error",
            AlertKind::TaskFailure => "Task Failure",
            AlertKind::Shutdown => "Shutdown",
        }
    }
}

/// Diagnostic DM body: kind label, local timestamp, clipped detail.
pub fn compose_alert(kind: AlertKind, detail: &str) -> String {
    let ts = Local::now().format("%Y-%m-%d %H:%M:%S");
    let clipped: String = detail.chars().take(ALERT_DETAIL_MAX).collect();
    format!(
        "🚨 **BOT ALERT**\n📌 Type: {}\n🕒 Time: {ts}\n\n```{clipped}```",
        kind.label()
    )
}

/// DM the operator. Failure here is logged, never escalated; there is
/// no secondary channel.
pub async fn notify_operator(chat: &dyn ChatPort, owner: UserId, kind: AlertKind, detail: &str) {
    let body = compose_alert(kind, detail);
    if let Err(e) = chat.send_direct(owner, &body, None).await {
        eprintln!("[ALERT] Failed to DM owner: {e}");
    }
}
