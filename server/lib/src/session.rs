//! Users who reacted to a prompt but have not yet handed us their verifier.

use std::collections::BTreeMap;

use crate::idprovider::interface::RequestToken;
use crate::prelude::*;

#[derive(Debug, Clone)]
pub struct PendingSession {
    pub user: UserId,
    /// The guild the prompt the user reacted to belongs to. The verifier
    /// arrives in a private message so this is the only place it is known.
    pub guild: GuildId,
    pub request: RequestToken,
    pub created: Duration,
}

/// At most one pending session exists per user.
#[derive(Debug, Default)]
pub struct SessionTracker {
    sessions: BTreeMap<UserId, PendingSession>,
    ttl: Option<Duration>,
}

impl SessionTracker {
    /// Without a `ttl` sessions stay until used or aborted.
    pub fn new(ttl: Option<Duration>) -> Self {
        SessionTracker {
            sessions: BTreeMap::new(),
            ttl,
        }
    }

    fn is_expired(&self, session: &PendingSession, ct: Duration) -> bool {
        match self.ttl {
            Some(ttl) => ct.saturating_sub(session.created) >= ttl,
            None => false,
        }
    }

    /// Start tracking a session, returning the one it replaced if the user
    /// already had one in flight.
    pub fn begin(
        &mut self,
        user: UserId,
        guild: GuildId,
        request: RequestToken,
        ct: Duration,
    ) -> Option<PendingSession> {
        let session = PendingSession {
            user: user.clone(),
            guild,
            request,
            created: ct,
        };
        let prev = self.sessions.insert(user, session);
        if let Some(prev) = &prev {
            debug!(user = %prev.user, guild = %prev.guild, "replaced pending session");
        }
        prev
    }

    pub fn take(&mut self, user: &UserId, ct: Duration) -> Result<PendingSession, OperationError> {
        let session = self
            .sessions
            .remove(user)
            .ok_or_else(|| OperationError::NoPendingSession(user.clone()))?;

        if self.is_expired(&session, ct) {
            debug!(%user, "pending session expired");
            return Err(OperationError::SessionExpired(user.clone()));
        }
        Ok(session)
    }

    /// Put back a session previously taken. A session the user started in
    /// the meantime wins.
    pub fn restore(&mut self, session: PendingSession) {
        self.sessions
            .entry(session.user.clone())
            .or_insert(session);
    }

    pub fn abort(&mut self, user: &UserId) -> Result<PendingSession, OperationError> {
        self.sessions
            .remove(user)
            .ok_or_else(|| OperationError::NoPendingSession(user.clone()))
    }

    /// Abort the user's session only while it is still the one started with
    /// request token `token`. A session begun since then is left alone.
    pub fn abort_if(&mut self, user: &UserId, token: &str) -> Option<PendingSession> {
        let current = self
            .sessions
            .get(user)
            .map(|s| s.request.token == token)
            .unwrap_or(false);
        if current {
            self.sessions.remove(user)
        } else {
            None
        }
    }

    pub fn contains(&self, user: &UserId) -> bool {
        self.sessions.contains_key(user)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop every expired session, returning how many were removed.
    pub fn purge_expired(&mut self, ct: Duration) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let before = self.sessions.len();
        self.sessions
            .retain(|_, s| ct.saturating_sub(s.created) < ttl);
        before - self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::request_token;

    const TTL: Duration = Duration::from_secs(900);

    #[test]
    fn test_begin_take() {
        let mut st = SessionTracker::new(Some(TTL));
        let user = UserId::from("u1");
        assert!(st
            .begin(user.clone(), GuildId::from("g1"), request_token("a"), Duration::from_secs(10))
            .is_none());
        assert!(st.contains(&user));

        let s = st.take(&user, Duration::from_secs(20)).expect("no session");
        assert_eq!(s.guild, GuildId::from("g1"));
        assert_eq!(s.request.token, "a");
        assert!(st.is_empty());

        assert_eq!(
            st.take(&user, Duration::from_secs(20)).map(|s| s.user),
            Err(OperationError::NoPendingSession(user))
        );
    }

    #[test]
    fn test_begin_replaces() {
        let mut st = SessionTracker::new(None);
        let user = UserId::from("u1");
        st.begin(user.clone(), GuildId::from("g1"), request_token("a"), Duration::ZERO);
        let prev = st
            .begin(user.clone(), GuildId::from("g2"), request_token("b"), Duration::ZERO)
            .expect("no previous session");
        assert_eq!(prev.request.token, "a");
        assert_eq!(st.len(), 1);

        let s = st.take(&user, Duration::ZERO).expect("no session");
        assert_eq!(s.guild, GuildId::from("g2"));
    }

    #[test]
    fn test_expiry() {
        let mut st = SessionTracker::new(Some(TTL));
        let user = UserId::from("u1");
        st.begin(user.clone(), GuildId::from("g1"), request_token("a"), Duration::from_secs(100));

        let r = st.take(&user, Duration::from_secs(100) + TTL);
        assert_eq!(
            r.map(|s| s.user),
            Err(OperationError::SessionExpired(user.clone()))
        );
        // The expired session is gone, not left behind.
        assert!(!st.contains(&user));
    }

    #[test]
    fn test_no_ttl_never_expires() {
        let mut st = SessionTracker::new(None);
        let user = UserId::from("u1");
        st.begin(user.clone(), GuildId::from("g1"), request_token("a"), Duration::ZERO);
        assert_eq!(st.purge_expired(Duration::from_secs(u32::MAX as u64)), 0);
        assert!(st.take(&user, Duration::from_secs(u32::MAX as u64)).is_ok());
    }

    #[test]
    fn test_purge_expired() {
        let mut st = SessionTracker::new(Some(TTL));
        st.begin(UserId::from("old"), GuildId::from("g"), request_token("a"), Duration::ZERO);
        st.begin(
            UserId::from("new"),
            GuildId::from("g"),
            request_token("b"),
            Duration::from_secs(600),
        );

        assert_eq!(st.purge_expired(Duration::from_secs(1000)), 1);
        assert!(!st.contains(&UserId::from("old")));
        assert!(st.contains(&UserId::from("new")));
    }

    #[test]
    fn test_restore_does_not_clobber() {
        let mut st = SessionTracker::new(None);
        let user = UserId::from("u1");
        st.begin(user.clone(), GuildId::from("g1"), request_token("a"), Duration::ZERO);
        let taken = st.take(&user, Duration::ZERO).expect("no session");

        st.begin(user.clone(), GuildId::from("g1"), request_token("b"), Duration::ZERO);
        st.restore(taken);
        assert_eq!(st.take(&user, Duration::ZERO).expect("no session").request.token, "b");
    }

    #[test]
    fn test_abort_if_only_matching_token() {
        let mut st = SessionTracker::new(None);
        let user = UserId::from("u1");
        assert!(st.abort_if(&user, "a").is_none());

        st.begin(user.clone(), GuildId::from("g1"), request_token("a"), Duration::ZERO);
        st.begin(user.clone(), GuildId::from("g1"), request_token("b"), Duration::ZERO);
        assert!(st.abort_if(&user, "a").is_none());
        assert!(st.contains(&user));

        let s = st.abort_if(&user, "b").expect("session b missing");
        assert_eq!(s.request.token, "b");
        assert!(st.is_empty());
    }

    #[test]
    fn test_abort() {
        let mut st = SessionTracker::new(None);
        let user = UserId::from("u1");
        assert!(st.abort(&user).is_err());
        st.begin(user.clone(), GuildId::from("g1"), request_token("a"), Duration::ZERO);
        assert!(st.abort(&user).is_ok());
        assert!(st.is_empty());
    }
}
