//! Test doubles for the chat platform and the identity provider.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use url::Url;
use usos_auth_proto::v1::{
    CourseEdition, LangDict, Programme, StudentProgramme, UsosUser,
};

use crate::idprovider::interface::{AccessToken, IdentityProvider, IdpError, RequestToken};
use crate::platform::{ChannelInfo, ChatPlatform, PlatformError, RoleInfo};
use crate::prelude::*;

pub const GOOD_VERIFIER: &str = "12345678";

pub fn request_token(token: &str) -> RequestToken {
    RequestToken {
        token: token.to_string(),
        secret: format!("{}-secret", token),
        authorization_url: Url::parse(&format!(
            "https://usos.example.com/services/oauth/authorize?oauth_token={}",
            token
        ))
        .expect("invalid url"),
    }
}

/// `programmes` are (id, pl name, en name).
pub fn profile(programmes: &[(&str, &str, &str)], courses: &[&str]) -> Profile {
    Profile {
        user: UsosUser {
            id: "100200".to_string(),
            first_name: "Jan".to_string(),
            last_name: "Kowalski".to_string(),
            student_programmes: programmes
                .iter()
                .enumerate()
                .map(|(i, (id, pl, en))| StudentProgramme {
                    id: i.to_string(),
                    programme: Programme {
                        id: id.to_string(),
                        description: LangDict {
                            pl: Some(pl.to_string()),
                            en: Some(en.to_string()),
                        },
                    },
                })
                .collect(),
        },
        courses: courses
            .iter()
            .map(|c| CourseEdition {
                course_id: c.to_string(),
                course_name: LangDict::default(),
                term_id: "2024L".to_string(),
            })
            .collect(),
    }
}

#[derive(Debug, Default)]
pub struct FakePlatformState {
    pub guild_names: BTreeMap<GuildId, String>,
    pub roles: BTreeMap<GuildId, Vec<RoleInfo>>,
    pub channels: BTreeMap<GuildId, Vec<ChannelInfo>>,
    pub member_roles: BTreeSet<(GuildId, UserId, RoleId)>,
    pub private_messages: Vec<(UserId, String)>,
    pub channel_messages: Vec<(ChannelId, String)>,
    pub reactions: Vec<(ChannelId, MessageId, String)>,
    pub closed_dms: BTreeSet<UserId>,
    pub fail_reactions: bool,
    next_message: u64,
}

#[derive(Debug, Default)]
pub struct FakePlatform {
    pub state: Mutex<FakePlatformState>,
    /// When set, the next private message waits for this to be notified and
    /// then fails.
    pub dm_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakePlatform {
    /// A guild "g" with role "member", channels "general" and "log".
    pub fn new() -> Self {
        let fp = FakePlatform::default();
        {
            let mut state = fp.state.lock().expect("poisoned");
            let g = GuildId::from("g");
            state.guild_names.insert(g.clone(), "Wydział".to_string());
            state.roles.insert(
                g.clone(),
                vec![RoleInfo {
                    id: RoleId::from("member"),
                    name: "Member".to_string(),
                }],
            );
            state.channels.insert(
                g,
                vec![
                    ChannelInfo {
                        id: ChannelId::from("general"),
                        name: "general".to_string(),
                    },
                    ChannelInfo {
                        id: ChannelId::from("log"),
                        name: "log".to_string(),
                    },
                ],
            );
        }
        fp
    }

    pub fn has_role(&self, guild: &str, user: &str, role: &str) -> bool {
        self.state.lock().expect("poisoned").member_roles.contains(&(
            GuildId::from(guild),
            UserId::from(user),
            RoleId::from(role),
        ))
    }

    pub fn private_messages_to(&self, user: &str) -> Vec<String> {
        self.state
            .lock()
            .expect("poisoned")
            .private_messages
            .iter()
            .filter(|(u, _)| u.as_str() == user)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn channel_messages_in(&self, channel: &str) -> Vec<String> {
        self.state
            .lock()
            .expect("poisoned")
            .channel_messages
            .iter()
            .filter(|(c, _)| c.as_str() == channel)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn send_private_message(&self, user: &UserId, text: &str) -> Result<(), PlatformError> {
        let gate = self.dm_gate.lock().expect("poisoned").take();
        if let Some(gate) = gate {
            gate.notified().await;
            return Err(PlatformError::Transport("gateway timeout".to_string()));
        }
        let mut state = self.state.lock().expect("poisoned");
        if state.closed_dms.contains(user) {
            return Err(PlatformError::Forbidden);
        }
        state.private_messages.push((user.clone(), text.to_string()));
        Ok(())
    }

    async fn send_channel_message(
        &self,
        channel: &ChannelId,
        text: &str,
    ) -> Result<MessageId, PlatformError> {
        let mut state = self.state.lock().expect("poisoned");
        state.channel_messages.push((channel.clone(), text.to_string()));
        state.next_message += 1;
        Ok(MessageId(format!("msg-{}", state.next_message)))
    }

    async fn add_reaction(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        emoji: &str,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock().expect("poisoned");
        if state.fail_reactions {
            return Err(PlatformError::Forbidden);
        }
        state
            .reactions
            .push((channel.clone(), message.clone(), emoji.to_string()));
        Ok(())
    }

    async fn guild_name(&self, guild: &GuildId) -> Result<String, PlatformError> {
        self.state
            .lock()
            .expect("poisoned")
            .guild_names
            .get(guild)
            .cloned()
            .ok_or(PlatformError::NotFound)
    }

    async fn guild_roles(&self, guild: &GuildId) -> Result<Vec<RoleInfo>, PlatformError> {
        self.state
            .lock()
            .expect("poisoned")
            .roles
            .get(guild)
            .cloned()
            .ok_or(PlatformError::NotFound)
    }

    async fn guild_channels(&self, guild: &GuildId) -> Result<Vec<ChannelInfo>, PlatformError> {
        self.state
            .lock()
            .expect("poisoned")
            .channels
            .get(guild)
            .cloned()
            .ok_or(PlatformError::NotFound)
    }

    async fn add_member_role(
        &self,
        guild: &GuildId,
        user: &UserId,
        role: &RoleId,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.lock().expect("poisoned");
        let exists = state
            .roles
            .get(guild)
            .map(|roles| roles.iter().any(|r| &r.id == role))
            .unwrap_or(false);
        if !exists {
            return Err(PlatformError::NotFound);
        }
        state
            .member_roles
            .insert((guild.clone(), user.clone(), role.clone()));
        Ok(())
    }

    async fn remove_member_role(
        &self,
        guild: &GuildId,
        user: &UserId,
        role: &RoleId,
    ) -> Result<(), PlatformError> {
        let removed = self.state.lock().expect("poisoned").member_roles.remove(&(
            guild.clone(),
            user.clone(),
            role.clone(),
        ));
        if removed {
            Ok(())
        } else {
            Err(PlatformError::NotFound)
        }
    }
}

#[derive(Debug)]
pub struct FakeIdp {
    pub profile: Mutex<Profile>,
    pub issued: Mutex<u64>,
    pub offline: Mutex<bool>,
}

impl FakeIdp {
    pub fn new(profile: Profile) -> Self {
        FakeIdp {
            profile: Mutex::new(profile),
            issued: Mutex::new(0),
            offline: Mutex::new(false),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().expect("poisoned") = offline;
    }

    fn check_online(&self) -> Result<(), IdpError> {
        if *self.offline.lock().expect("poisoned") {
            Err(IdpError::Transport("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdp {
    async fn begin(&self) -> Result<RequestToken, IdpError> {
        self.check_online()?;
        let mut issued = self.issued.lock().expect("poisoned");
        *issued += 1;
        Ok(request_token(&format!("req-{}", *issued)))
    }

    async fn complete(
        &self,
        request: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken, IdpError> {
        self.check_online()?;
        if verifier != GOOD_VERIFIER {
            return Err(IdpError::WrongVerifier);
        }
        Ok(AccessToken {
            token: format!("acc-{}", request.token),
            secret: "acc-secret".to_string(),
        })
    }

    async fn profile(&self, _token: &AccessToken) -> Result<Profile, IdpError> {
        self.check_online()?;
        Ok(self.profile.lock().expect("poisoned").clone())
    }
}
