use bevy::prelude::*;

use crate::shared::*;

/// At most this many toasts are visible; the oldest is dropped first.
pub const MAX_VISIBLE_TOASTS: usize = 3;

#[derive(Debug, Clone)]
pub struct ActiveToast {
    pub message: String,
    pub timer: Timer,
}

#[derive(Resource, Debug, Default)]
pub struct ToastLog {
    pub visible: Vec<ActiveToast>,
}

impl ToastLog {
    pub fn push(&mut self, message: String, duration_secs: f32) {
        if self.visible.len() >= MAX_VISIBLE_TOASTS {
            self.visible.remove(0);
        }
        self.visible.push(ActiveToast {
            message,
            timer: Timer::from_seconds(duration_secs, TimerMode::Once),
        });
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.visible.iter().map(|t| t.message.as_str())
    }
}

pub fn handle_toast_events(mut events: EventReader<ToastEvent>, mut log: ResMut<ToastLog>) {
    for event in events.read() {
        info!("[Toast] {}", event.message);
        log.push(event.message.clone(), event.duration_secs);
    }
}

pub fn expire_toasts(time: Res<Time>, mut log: ResMut<ToastLog>) {
    for toast in &mut log.visible {
        toast.timer.tick(time.delta());
    }
    log.visible.retain(|t| !t.timer.finished());
}
