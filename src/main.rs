use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use ndvi_farm::autopilot::AutopilotPlugin;
use ndvi_farm::avatar::AvatarPlugin;
use ndvi_farm::bus::{install_wire_logger, EventBus, EventBusPlugin};
use ndvi_farm::campaign::{Campaign, CampaignPlugin};
use ndvi_farm::data::{CampaignConfig, DataPlugin};
use ndvi_farm::farming::{FarmingPlugin, HarvestLedger};
use ndvi_farm::scene::ScenePlugin;
use ndvi_farm::shared::*;
use ndvi_farm::ui::{NdviDashboard, UiPlugin};

const FRAME: Duration = Duration::from_nanos(1_000_000_000 / 60);

fn main() -> AppExit {
    let config = match std::env::args().nth(1) {
        Some(path) => match CampaignConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("ndvi-farm: {}: {}", path, err);
                return AppExit::error();
            }
        },
        None => CampaignConfig::default(),
    };

    let mut app = App::new();
    app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(FRAME)))
        .add_plugins(LogPlugin {
            level: Level::INFO,
            filter: "ndvi_farm=info".into(),
            ..default()
        })
        .add_plugins(StatesPlugin)
        // Game state
        .init_state::<GameState>()
        .insert_resource(config)
        // Domain plugins
        .add_plugins(DataPlugin)
        .add_plugins(EventBusPlugin)
        .add_plugins(ScenePlugin)
        .add_plugins(FarmingPlugin)
        .add_plugins(CampaignPlugin)
        .add_plugins(AvatarPlugin)
        .add_plugins(UiPlugin)
        .add_plugins(AutopilotPlugin)
        // Shutdown
        .add_systems(OnEnter(GameState::Won), report_and_exit)
        .add_systems(OnEnter(GameState::Lost), report_and_exit);

    install_wire_logger(&mut app.world_mut().resource_mut::<EventBus>());

    app.run()
}

fn report_and_exit(
    state: Res<State<GameState>>,
    campaign: Res<Campaign>,
    ledger: Res<HarvestLedger>,
    dashboard: Res<NdviDashboard>,
    mut exit: EventWriter<AppExit>,
) {
    info!(
        "[Campaign] Season over ({:?}) after week {}: money {}, crop health {}%",
        state.get(),
        campaign.week_index.min(campaign.total_weeks().saturating_sub(1)) + 1,
        campaign.money,
        campaign.crop_health
    );
    info!(
        "[Harvest] {} units harvested; {} NDVI readings, last status {:?}",
        ledger.total,
        dashboard.readings,
        dashboard.status()
    );
    exit.send(AppExit::Success);
}
