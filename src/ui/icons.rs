pub struct Icons;

impl Icons {
    pub const ROCKET: &str = "🚀";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const INBOX: &str = "📥";
    pub const OUTBOX: &str = "📤";
    pub const TAG: &str = "🏷️";
    pub const GLOBE: &str = "🌍";
}
