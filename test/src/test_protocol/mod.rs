/// Game-style replicable types shared by the E2E tests

use std::sync::Arc;

use log::warn;

use replica_shared::{
    DescriptorBuilder, InstanceId, Protocol, Replicable, RpcOutbox, Target, TypeRegistry, Value,
    ValueKind, Vec3, Visibility,
};

pub const HEAL_ITEM: i32 = 1;

const MAX_CHAT_LENGTH: usize = 100;
const MAX_STEP_SQUARED: f32 = 16.0 * 1.5;

// PlayerInfo

/// Display name and chat for one connected player
#[derive(Default)]
pub struct PlayerInfo {
    pub name: String,
    pub chat_log: Vec<String>,
}

impl PlayerInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            chat_log: Vec::new(),
        }
    }

    fn say(&mut self, args: &[Value], outbox: &mut RpcOutbox) {
        let Some(message) = args[0].as_str() else {
            return;
        };
        if message.is_empty() || message.len() > MAX_CHAT_LENGTH {
            return;
        }
        outbox.send("chat_message", vec![message.into()]);
    }

    fn chat_message(&mut self, args: &[Value], _: &mut RpcOutbox) {
        if let Some(message) = args[0].as_str() {
            let line = format!("{}: {}", self.name, message);
            self.chat_log.push(line);
        }
    }

    fn system_message(&mut self, args: &[Value], _: &mut RpcOutbox) {
        if let Some(message) = args[0].as_str() {
            self.chat_log.push(message.to_string());
        }
    }
}

impl Replicable for PlayerInfo {
    fn describe(builder: &mut DescriptorBuilder<Self>) {
        builder
            .field("name", Visibility::Protected, |p| &p.name, |p| &mut p.name)
            .method("say", Target::Server, &[ValueKind::Str], PlayerInfo::say)
            .method(
                "chat_message",
                Target::Multicast,
                &[ValueKind::Str],
                PlayerInfo::chat_message,
            )
            .method(
                "system_message",
                Target::Client,
                &[ValueKind::Str],
                PlayerInfo::system_message,
            );
    }
}

// SimplePlayer

/// A player avatar. The owning client reports its position, the server
/// replicates it back to everyone every tick.
#[derive(Default)]
pub struct SimplePlayer {
    pub player_info: Option<InstanceId>,
    pub held_item: i32,
    pub position: Vec3,

    pub items_used: u32,
    pub lerp_target_changed: bool,
    pub post_apply_count: u32,
}

impl SimplePlayer {
    pub fn new(player_info: InstanceId) -> Self {
        Self {
            player_info: Some(player_info),
            ..Default::default()
        }
    }

    fn use_item(&mut self, _: &[Value], _: &mut RpcOutbox) {
        if self.held_item == HEAL_ITEM {
            self.held_item = 0;
            self.items_used += 1;
        }
    }

    fn set_player_position(&mut self, args: &[Value], _: &mut RpcOutbox) {
        let Some(mut position) = args[0].as_vec3() else {
            return;
        };
        position.z = 0.0;

        let (dx, dy) = (position.x - self.position.x, position.y - self.position.y);
        if dx * dx + dy * dy > MAX_STEP_SQUARED {
            warn!("Player tried to move too fast");
        }
        self.position = position;
    }
}

impl Replicable for SimplePlayer {
    fn describe(builder: &mut DescriptorBuilder<Self>) {
        builder
            .field("player_info", Visibility::Protected, |p| &p.player_info, |p| {
                &mut p.player_info
            })
            .field("held_item", Visibility::Protected, |p| &p.held_item, |p| {
                &mut p.held_item
            })
            .field("position", Visibility::Public, |p| &p.position, |p| {
                &mut p.position
            })
            .method("use_item", Target::Server, &[], SimplePlayer::use_item)
            .method(
                "set_player_position",
                Target::Server,
                &[ValueKind::Vec3],
                SimplePlayer::set_player_position,
            );
    }

    fn on_post_apply(&mut self) {
        self.lerp_target_changed = true;
        self.post_apply_count += 1;
    }

    fn always_replicate(&self) -> bool {
        true
    }
}

// SimpleBullet

#[derive(Default)]
pub struct SimpleBullet {
    pub age: f32,
    pub move_direction: Vec3,
    pub creator: Option<InstanceId>,

    pub lerp_target_changed: bool,
}

impl Replicable for SimpleBullet {
    fn describe(builder: &mut DescriptorBuilder<Self>) {
        builder
            .field("age", Visibility::Protected, |b| &b.age, |b| &mut b.age)
            .field("move_direction", Visibility::Protected, |b| &b.move_direction, |b| {
                &mut b.move_direction
            })
            .field("creator", Visibility::Protected, |b| &b.creator, |b| {
                &mut b.creator
            });
    }

    fn on_post_apply(&mut self) {
        self.lerp_target_changed = true;
    }
}

/// The game protocol, built over a fresh registry so tests stay isolated
pub fn protocol() -> Protocol {
    Protocol::builder()
        .registry(Arc::new(TypeRegistry::new()))
        .add_replicable::<PlayerInfo>()
        .add_replicable::<SimplePlayer>()
        .add_replicable::<SimpleBullet>()
        .build()
}
