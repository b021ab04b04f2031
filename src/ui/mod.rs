//! UI domain: read-only projections for the presentation layer.
//!
//! Nothing here mutates the simulation. The HUD snapshot is rebuilt in
//! `PostUpdate`, after the frame's decisions have been applied.

mod dashboard;
mod hud;
mod toast;

pub use dashboard::{NdviDashboard, NdviStatus};
pub use hud::{format_money, HealthLevel, HudSnapshot, MoistureLevel};
pub use toast::{ActiveToast, ToastLog, MAX_VISIBLE_TOASTS};

use bevy::prelude::*;

use crate::bus::EventBus;
use crate::campaign::Campaign;
use crate::shared::*;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EventBus>()
            .init_resource::<Campaign>()
            .init_resource::<HudSnapshot>()
            .init_resource::<NdviDashboard>()
            .init_resource::<ToastLog>()
            .add_event::<ToastEvent>();

        // ─── TOASTS ───
        app.add_systems(
            Update,
            (toast::handle_toast_events, toast::expire_toasts).chain(),
        );

        // ─── HUD: every frame, whatever the state ───
        app.add_systems(PostUpdate, hud::refresh_hud);

        app.world_mut()
            .resource_mut::<EventBus>()
            .subscribe(EventKind::NdviUpdate, None, dashboard::on_ndvi_update);
    }
}
