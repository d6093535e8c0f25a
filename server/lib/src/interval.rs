//! Background tasks that run on a schedule next to the bot.

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};

use crate::authorizer::Authorizer;
use crate::idprovider::interface::IdentityProvider;
use crate::platform::ChatPlatform;
use crate::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAction {
    Shutdown,
}

/// Periodically drops pending authorizations that outlived the session ttl.
pub struct SessionReaper;

impl SessionReaper {
    pub fn start<P, I>(
        authorizer: Arc<Authorizer<P, I>>,
        period: Duration,
        mut rx: broadcast::Receiver<BotAction>,
    ) -> tokio::task::JoinHandle<()>
    where
        P: ChatPlatform + 'static,
        I: IdentityProvider + 'static,
    {
        tokio::spawn(async move {
            let mut inter = interval(period);
            inter.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    action = rx.recv() => {
                        match action {
                            Ok(BotAction::Shutdown) | Err(broadcast::error::RecvError::Closed) => break,
                            Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        }
                    }
                    _ = inter.tick() => {
                        let purged = authorizer
                            .purge_expired_sessions(duration_from_epoch_now())
                            .await;
                        if purged > 0 {
                            admin_info!(purged, "purged expired authorization sessions");
                        }
                    }
                }
            }

            info!("Stopped session reaper");
        })
    }
}
