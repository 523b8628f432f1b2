use std::fmt;

/// Phases of a client session, in the order they are walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Init,
    OfflineReq1,
    OfflineReq2,
    OnlineConnect,
    NotifyIncoming,
    AwaitChallenge,
    SendVerify,
    Alive,
    Disconnecting,
    Closed,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Init => "INIT",
            SessionState::OfflineReq1 => "OFFLINE_REQ1",
            SessionState::OfflineReq2 => "OFFLINE_REQ2",
            SessionState::OnlineConnect => "ONLINE_CONNECT",
            SessionState::NotifyIncoming => "NOTIFY_INCOMING",
            SessionState::AwaitChallenge => "AWAIT_CHALLENGE",
            SessionState::SendVerify => "SEND_VERIFY",
            SessionState::Alive => "ALIVE",
            SessionState::Disconnecting => "DISCONNECTING",
            SessionState::Closed => "CLOSED",
        }
    }

    /// The phase that follows on success. `Closed` is terminal.
    pub fn next(&self) -> SessionState {
        match self {
            SessionState::Init => SessionState::OfflineReq1,
            SessionState::OfflineReq1 => SessionState::OfflineReq2,
            SessionState::OfflineReq2 => SessionState::OnlineConnect,
            SessionState::OnlineConnect => SessionState::NotifyIncoming,
            SessionState::NotifyIncoming => SessionState::AwaitChallenge,
            SessionState::AwaitChallenge => SessionState::SendVerify,
            SessionState::SendVerify => SessionState::Alive,
            SessionState::Alive => SessionState::Disconnecting,
            SessionState::Disconnecting | SessionState::Closed => SessionState::Closed,
        }
    }

    /// True once the server knows about this session, i.e. frames are
    /// flowing and a disconnect notification makes sense.
    pub fn is_online(&self) -> bool {
        matches!(
            self,
            SessionState::OnlineConnect
                | SessionState::NotifyIncoming
                | SessionState::AwaitChallenge
                | SessionState::SendVerify
                | SessionState::Alive
                | SessionState::Disconnecting
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
