//! Recovery policies applied to codec errors.

/// How the connection runtime responds to a codec error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecoveryPolicy {
    /// Discard the offending envelope and keep reading.
    ///
    /// Used when framing is intact but the payload is not understood.
    #[default]
    Drop,

    /// Close the connection and reset session state.
    ///
    /// Used when the byte stream can no longer be trusted or the transport
    /// has failed.
    Disconnect,
}

