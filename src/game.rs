use crate::animation::*;
use crate::args::Args;
use crate::camera::*;
use crate::collision::{detect_collisions, PlayerHit};
use crate::components::*;
use crate::debug_panel::DebugPanelPlugin;
use crate::host::{self, drain_host_commands, host_channel, HostCommands};
use crate::hud::HudPlugin;
use crate::input::*;
use crate::model::prepare_models;
use crate::player::*;
use crate::settings::RunnerSettings;
use crate::state::*;
use crate::world::*;
use bevy::app::AppExit;
use bevy::gltf::Gltf;
use bevy::prelude::*;
use bevy_asset_loader::prelude::*;
use bevy_egui::EguiPlugin;

pub fn run_game(args: Args, on_state_change: Option<StateCallback>) {
    info!("Args: {args:?}");

    let settings = args.settings();
    let settings = match settings.validate() {
        Ok(()) => settings,
        Err(err) => {
            error!("invalid settings ({err}), falling back to defaults");
            RunnerSettings::default()
        }
    };

    let (handle, host_commands) = host_channel();
    host::install(handle);

    App::new()
        .add_plugins((
            DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Endless Runner".into(),
                    canvas: Some(args.canvas.clone()),
                    // fill the element the page mounted us into
                    fit_canvas_to_parent: true,
                    prevent_default_event_handling: true,
                    ..default()
                }),
                ..default()
            }),
            EguiPlugin,
            RunnerPlugin {
                settings,
                clip_mapping: args.clip_mapping(),
                seed: args.seed,
                on_state_change,
                host: Some(host_commands),
            },
            DebugPanelPlugin {
                visible: !args.no_debug_panel,
            },
        ))
        .insert_resource(args)
        .run();
}

/// The whole game: lifecycle, world, player, collisions and presentation.
pub struct RunnerPlugin {
    pub settings: RunnerSettings,
    pub clip_mapping: ClipMapping,
    pub seed: Option<u64>,
    pub on_state_change: Option<StateCallback>,
    pub host: Option<HostCommands>,
}

impl RunnerPlugin {
    pub fn new(settings: RunnerSettings) -> Self {
        Self {
            settings,
            clip_mapping: ClipMapping::default(),
            seed: None,
            on_state_change: None,
            host: None,
        }
    }

    pub fn with_state_callback(mut self, callback: StateCallback) -> Self {
        self.on_state_change = Some(callback);
        self
    }
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
enum RunnerSet {
    /// Host requests, keyboard, frame clock
    Input,
    /// Start, restart and dispose
    Lifecycle,
    /// Player and world motion, collisions
    Simulation,
    /// Camera, animation, model fitting
    Presentation,
}

/// Present once the runner has been torn down.
#[derive(Resource)]
struct Disposed;

#[derive(Resource, Clone, Copy)]
struct RunnerSeed(Option<u64>);

impl Plugin for RunnerPlugin {
    fn build(&self, app: &mut App) {
        app.add_state::<RunnerState>()
            .add_loading_state(
                LoadingState::new(RunnerState::Loading).continue_to_state(RunnerState::Ready),
            )
            .add_collection_to_loading_state::<_, RunnerAssets>(RunnerState::Loading)
            .insert_resource(self.settings.clone())
            .insert_resource(self.clip_mapping.clone())
            .insert_resource(RunnerSeed(self.seed))
            .insert_resource(StateNotifier::new(self.on_state_change.clone()))
            .insert_resource(ClearColor(Color::rgb(0.53, 0.63, 0.75)))
            .insert_resource(AmbientLight {
                color: Color::WHITE,
                brightness: 0.4,
            })
            .init_resource::<FrameClock>()
            .init_resource::<LocalInput>()
            .init_resource::<Distance>()
            .init_resource::<BackgroundCursor>()
            .add_event::<StartRun>()
            .add_event::<RestartRun>()
            .add_event::<DisposeRunner>()
            .add_event::<PlayerHit>()
            .add_event::<Jumped>()
            .add_event::<Landed>()
            .add_event::<AnimationReset>()
            .add_plugins(HudPlugin)
            .configure_sets(
                Update,
                (
                    RunnerSet::Input,
                    RunnerSet::Lifecycle,
                    RunnerSet::Simulation,
                    RunnerSet::Presentation,
                )
                    .chain()
                    .run_if(not(resource_exists::<Disposed>())),
            )
            .add_systems(OnEnter(RunnerState::Ready), setup_world)
            .add_systems(Update, report_state_changes)
            .add_systems(
                Update,
                (read_local_inputs, tick_frame_clock).in_set(RunnerSet::Input),
            )
            .add_systems(
                Update,
                (
                    handle_activation
                        .run_if(in_state(RunnerState::Ready).or_else(in_state(RunnerState::Dead))),
                    (start_run, restart_run, reseed_on_restart, rotate_background_on_restart),
                    dispose_runner,
                )
                    .chain()
                    .in_set(RunnerSet::Lifecycle),
            )
            .add_systems(
                Update,
                (
                    steer_player,
                    move_player,
                    (scroll_floor, scroll_obstacles, accumulate_distance),
                    detect_collisions,
                    handle_player_hit,
                )
                    .chain()
                    .in_set(RunnerSet::Simulation)
                    .run_if(in_state(RunnerState::Running)),
            )
            .add_systems(
                Update,
                (
                    camera_follow
                        .run_if(in_state(RunnerState::Running).or_else(in_state(RunnerState::Dead))),
                    prepare_models,
                    (attach_animators, idle_new_animators, drive_character_animation).chain(),
                )
                    .in_set(RunnerSet::Presentation),
            );

        if let Some(host) = &self.host {
            app.insert_resource(host.clone())
                .add_systems(Update, drain_host_commands.in_set(RunnerSet::Input));
        }
    }
}

fn setup_world(
    mut commands: Commands,
    settings: Res<RunnerSettings>,
    assets: Res<RunnerAssets>,
    gltfs: Res<Assets<Gltf>>,
    mapping: Res<ClipMapping>,
    seed: Res<RunnerSeed>,
    cursor: Res<BackgroundCursor>,
    time: Res<Time>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    info!("Spawning world");
    let seed = seed.0.unwrap_or_else(|| time.elapsed().as_nanos() as u64);
    let mut rng = RunnerRng::seeded(seed);
    let mut handles = RunnerHandles::default();

    commands.spawn((
        RunnerEntity,
        DirectionalLightBundle {
            directional_light: DirectionalLight {
                shadows_enabled: true,
                ..default()
            },
            transform: Transform::from_xyz(-4.0, 10.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
            ..default()
        },
    ));
    spawn_camera(&mut commands, &settings);

    let floor = spawn_floor(&mut commands, &settings, &mut meshes, &mut materials, &mut handles);
    let obstacles = spawn_obstacles(&mut commands, &settings, &assets, &mut rng);
    spawn_background(
        &mut commands,
        &settings,
        &assets,
        &cursor,
        &mut meshes,
        &mut materials,
        &mut handles,
    );

    let gltf = gltfs.get(&assets.player);
    let scene = gltf.and_then(|gltf| gltf.default_scene.clone().or_else(|| gltf.scenes.first().cloned()));
    let mut player = commands.spawn((
        Player,
        RunnerEntity,
        Lane::CENTER,
        VerticalMotion::default(),
        Collider::grounded(Vec3::new(0.8, settings.player_height, 0.8)),
        FitHeight(settings.player_height),
        SpatialBundle::default(),
    ));
    match scene {
        Some(scene) => {
            player.with_children(|parent| {
                parent.spawn(SceneBundle {
                    scene,
                    // models face +Z, the track runs along +X
                    transform: Transform::from_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)),
                    ..default()
                });
            });
        }
        None => warn!("player model has no scene, running with an invisible player"),
    }

    if let Some(gltf) = gltf {
        match CharacterClips::from_gltf(gltf, &mapping) {
            Ok(clips) => {
                commands.insert_resource(clips);
            }
            Err(err) => error!("character will not animate: {err}"),
        }
    }

    commands.insert_resource(floor);
    commands.insert_resource(obstacles);
    commands.insert_resource(rng);
    commands.insert_resource(handles);
}

fn handle_activation(
    input: Res<LocalInput>,
    state: Res<State<RunnerState>>,
    mut starts: EventWriter<StartRun>,
    mut restarts: EventWriter<RestartRun>,
) {
    if !activate(input.0) {
        return;
    }
    match state.get() {
        RunnerState::Ready => starts.send(StartRun),
        RunnerState::Dead => restarts.send(RestartRun),
        _ => {}
    }
}

fn start_run(
    mut starts: EventReader<StartRun>,
    state: Res<State<RunnerState>>,
    mut next_state: ResMut<NextState<RunnerState>>,
    mut clock: ResMut<FrameClock>,
    mut resets: EventWriter<AnimationReset>,
) {
    if starts.read().count() == 0 {
        return;
    }
    if request_transition(&state, &mut next_state, RunnerState::Running) {
        clock.reset();
        resets.send(AnimationReset);
    }
}

fn restart_allowed(state: RunnerState) -> bool {
    state != RunnerState::Loading
}

fn restart_run(
    mut restarts: EventReader<RestartRun>,
    state: Res<State<RunnerState>>,
    mut next_state: ResMut<NextState<RunnerState>>,
    settings: Res<RunnerSettings>,
    mut clock: ResMut<FrameClock>,
    mut distance: ResMut<Distance>,
    mut players: Query<(&mut Transform, &mut VerticalMotion, &mut Lane), With<Player>>,
    mut cameras: Query<&mut Transform, (With<FollowCamera>, Without<Player>)>,
    mut resets: EventWriter<AnimationReset>,
) {
    if restarts.read().count() == 0 {
        return;
    }
    let current = *state.get();
    if !restart_allowed(current) {
        warn!("restart ignored while {}", current.name());
        return;
    }
    info!("Restarting run");
    if current != RunnerState::Running {
        request_transition(&state, &mut next_state, RunnerState::Running);
    }
    distance.finish_run();
    distance.current = 0.0;
    clock.reset();
    for (mut transform, mut motion, mut lane) in &mut players {
        reset_player(&mut transform, &mut motion, &mut lane);
    }
    for mut transform in &mut cameras {
        reset_camera(&mut transform, &settings);
    }
    resets.send(AnimationReset);
}

fn reseed_on_restart(
    mut restarts: EventReader<RestartRun>,
    state: Res<State<RunnerState>>,
    settings: Res<RunnerSettings>,
    floor: Option<Res<FloorPool>>,
    obstacles: Option<Res<ObstaclePool>>,
    rng: Option<ResMut<RunnerRng>>,
    mut pooled: Query<(&mut Transform, Option<&mut Lane>), Or<(With<FloorSegment>, With<Obstacle>)>>,
) {
    if restarts.read().count() == 0 || !restart_allowed(*state.get()) {
        return;
    }
    let (Some(floor), Some(obstacles), Some(mut rng)) = (floor, obstacles, rng) else {
        return;
    };
    reseed_world(&settings, &floor, &obstacles, &mut rng, &mut pooled);
}

fn rotate_background_on_restart(
    mut restarts: EventReader<RestartRun>,
    state: Res<State<RunnerState>>,
    assets: Option<Res<RunnerAssets>>,
    handles: Option<ResMut<RunnerHandles>>,
    mut cursor: ResMut<BackgroundCursor>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut backgrounds: Query<&mut Handle<StandardMaterial>, With<Background>>,
) {
    if restarts.read().count() == 0 || !restart_allowed(*state.get()) {
        return;
    }
    let (Some(assets), Some(mut handles)) = (assets, handles) else {
        return;
    };
    advance_background(&assets, &mut cursor, &mut materials, &mut handles, &mut backgrounds);
}

fn handle_player_hit(
    mut hits: EventReader<PlayerHit>,
    state: Res<State<RunnerState>>,
    mut next_state: ResMut<NextState<RunnerState>>,
    mut distance: ResMut<Distance>,
) {
    if hits.read().count() == 0 {
        return;
    }
    if request_transition(&state, &mut next_state, RunnerState::Dead) {
        distance.finish_run();
        info!("player died after {:.0} m", distance.current);
    }
}

/// Despawns everything and drops every handle the runner owns, which frees
/// the meshes, materials and textures behind them.
fn dispose_runner(
    mut disposes: EventReader<DisposeRunner>,
    mut commands: Commands,
    entities: Query<Entity, With<RunnerEntity>>,
    mut exit: EventWriter<AppExit>,
) {
    if disposes.read().count() == 0 {
        return;
    }
    for entity in &entities {
        commands.entity(entity).despawn_recursive();
    }
    commands.remove_resource::<RunnerHandles>();
    commands.remove_resource::<RunnerAssets>();
    commands.remove_resource::<CharacterClips>();
    commands.remove_resource::<FloorPool>();
    commands.remove_resource::<ObstaclePool>();
    commands.insert_resource(Disposed);
    info!("runner disposed");
    exit.send(AppExit);
}
