//! Structured logging helpers.
//!
//! Every event carries a `subsystem` field (gateway, ws, storage, node) so
//! JSON output can be filtered per component.

/// Helper to create structured log entries with consistent formatting.
#[macro_export]
macro_rules! log_event {
    // Info level with subsystem
    (info, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        $crate::tracing::info!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    // Warn level with subsystem
    (warn, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        $crate::tracing::warn!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    // Error level with subsystem
    (error, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        $crate::tracing::error!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    // Debug level with subsystem
    (debug, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        $crate::tracing::debug!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a WebSocket connection event with standard fields.
#[macro_export]
macro_rules! log_connection_event {
    ($level:ident, $msg:expr, $conn_id:expr $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            subsystem = "ws",
            conn_id = %$conn_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a chat room event with standard fields.
#[macro_export]
macro_rules! log_chat_event {
    ($level:ident, $msg:expr, $chat_id:expr $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            subsystem = "chat",
            chat_id = %$chat_id,
            $($($field)*,)?
            $msg
        )
    };
}
