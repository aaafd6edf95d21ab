use crate::AppState;
use crate::character::{CharacterController, PlayerAvatar};
use crate::input::InputGate;
use crate::scene_runtime::pipeline::ExplorePipelineSet;
use crate::settings::{
    self, FpsLimitSetting, GameSettings, ResolutionSetting, SettingsResource,
    ShadowQualitySetting, TurnModeSetting, WindowModeSetting,
};
use crate::world::LoadingProgress;
use bevy::prelude::*;
use bevy::state::prelude::{OnEnter, in_state};
use bevy_egui::{EguiContexts, EguiPrimaryContextPass, egui};

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HudUiState>()
            .add_systems(OnEnter(AppState::Exploring), reset_exploring_hud_state)
            .add_systems(
                Update,
                (
                    toggle_settings_modal_with_escape.run_if(in_state(AppState::Exploring)),
                    sync_modal_input_gate,
                )
                    .chain()
                    .in_set(ExplorePipelineSet::UiSync),
            )
            .add_systems(EguiPrimaryContextPass, draw_hud_egui);
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Default)]
enum SettingsTab {
    #[default]
    Graphics,
    Controls,
}

#[derive(Resource, Default)]
pub struct HudUiState {
    settings_open: bool,
    settings_tab: SettingsTab,
    draft: GameSettings,
}

impl HudUiState {
    pub fn settings_open(&self) -> bool {
        self.settings_open
    }

    fn open_settings(&mut self, current: &GameSettings) {
        self.settings_open = true;
        self.settings_tab = SettingsTab::Graphics;
        self.draft = current.clone();
    }
}

fn reset_exploring_hud_state(mut hud_state: ResMut<HudUiState>, settings: Res<SettingsResource>) {
    hud_state.settings_open = false;
    hud_state.settings_tab = SettingsTab::Graphics;
    hud_state.draft = settings.current.clone();
}

pub fn toggle_settings_modal_with_escape(
    keys: Res<ButtonInput<KeyCode>>,
    settings_resource: Res<SettingsResource>,
    mut hud_state: ResMut<HudUiState>,
) {
    if !keys.just_pressed(KeyCode::Escape) {
        return;
    }

    if hud_state.settings_open {
        hud_state.settings_open = false;
    } else {
        hud_state.open_settings(&settings_resource.current);
    }
}

/// Keep the input gate closed while the settings modal is up.
pub fn sync_modal_input_gate(hud_state: Res<HudUiState>, mut gate: ResMut<InputGate>) {
    if gate.modal_open != hud_state.settings_open {
        gate.modal_open = hud_state.settings_open;
    }
}

fn draw_hud_egui(
    mut contexts: EguiContexts,
    mut hud_state: ResMut<HudUiState>,
    mut settings_resource: ResMut<SettingsResource>,
    app_state: Res<State<AppState>>,
    progress: Option<Res<LoadingProgress>>,
    mut controllers: Query<&mut CharacterController, With<PlayerAvatar>>,
    mut themed: Local<bool>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    if !*themed {
        ctx.style_mut(round_hud_widgets);
        *themed = true;
    }

    match app_state.get() {
        AppState::Loading => {
            let percent = progress.map_or(0, |progress| progress.percent());
            draw_loading_overlay(ctx, percent);
        }
        AppState::Exploring => {
            let controller = controllers.single_mut().ok();
            draw_bottom_bar(&mut hud_state, &settings_resource, controller, ctx);

            if hud_state.settings_open {
                draw_settings_modal(&mut hud_state, &mut settings_resource, ctx);
            }
        }
    }
}

fn round_hud_widgets(style: &mut egui::Style) {
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(10.0, 6.0);
    style.visuals.window_corner_radius = egui::CornerRadius::same(10);
    let widgets = &mut style.visuals.widgets;
    for visuals in [&mut widgets.inactive, &mut widgets.hovered, &mut widgets.active] {
        visuals.corner_radius = egui::CornerRadius::same(6);
    }
}

fn draw_loading_overlay(ctx: &egui::Context, percent: u32) {
    egui::CentralPanel::default()
        .frame(egui::Frame::new().fill(egui::Color32::from_rgb(12, 20, 16)))
        .show(ctx, |ui| {
            ui.centered_and_justified(|ui| {
                ui.label(
                    egui::RichText::new(format!("Generating World {percent}%"))
                        .size(28.0)
                        .color(egui::Color32::from_rgb(210, 235, 200)),
                );
            });
        });
}

fn draw_bottom_bar(
    hud_state: &mut HudUiState,
    settings_resource: &SettingsResource,
    controller: Option<Mut<CharacterController>>,
    ctx: &egui::Context,
) {
    egui::TopBottomPanel::bottom("hud_bottom_bar")
        .resizable(false)
        .frame(egui::Frame::NONE)
        .show(ctx, |ui| {
            ui.add_space(6.0);
            ui.vertical_centered(|ui| {
                egui::Frame::new()
                    .fill(egui::Color32::from_black_alpha(140))
                    .corner_radius(egui::CornerRadius::same(10))
                    .inner_margin(egui::Margin::symmetric(14, 8))
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            if let Some(mut controller) = controller {
                                ui.label(
                                    egui::RichText::new(controller.state().name())
                                        .monospace()
                                        .color(egui::Color32::WHITE),
                                );
                                let mode = if controller.run_mode() { "Run" } else { "Walk" };
                                if ui
                                    .add_sized(egui::vec2(72.0, 42.0), egui::Button::new(mode))
                                    .on_hover_text("Shift")
                                    .clicked()
                                {
                                    controller.toggle_run_mode();
                                }
                            }

                            if ui
                                .add_sized(egui::vec2(96.0, 42.0), egui::Button::new("Settings"))
                                .on_hover_text("Esc")
                                .clicked()
                            {
                                hud_state.open_settings(&settings_resource.current);
                            }
                        });
                    });
            });
            ui.add_space(8.0);
        });
}

fn draw_settings_modal(
    hud_state: &mut HudUiState,
    settings_resource: &mut SettingsResource,
    ctx: &egui::Context,
) {
    let mut window_open = hud_state.settings_open;
    let mut should_apply = false;
    let mut should_close = false;

    egui::Window::new("Settings")
        .open(&mut window_open)
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .collapsible(false)
        .resizable(false)
        .movable(false)
        .default_width(520.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(
                    &mut hud_state.settings_tab,
                    SettingsTab::Graphics,
                    "Graphics",
                );
                ui.selectable_value(
                    &mut hud_state.settings_tab,
                    SettingsTab::Controls,
                    "Controls",
                );
            });

            ui.separator();

            match hud_state.settings_tab {
                SettingsTab::Graphics => draw_graphics_settings_tab(ui, &mut hud_state.draft),
                SettingsTab::Controls => draw_controls_settings_tab(ui, &mut hud_state.draft),
            }

            ui.separator();
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                should_apply = ui.button("Apply").clicked();
                should_close = ui.button("Close").clicked();
            });
        });

    if should_apply {
        settings_resource.current = hud_state.draft.clone();
        if let Err(error) = settings_resource.save_to_disk() {
            warn!(
                "Failed to save settings file '{}': {}",
                settings::SETTINGS_FILE_PATH,
                error
            );
        }
    }

    if should_close {
        window_open = false;
    }

    if !window_open {
        hud_state.draft = settings_resource.current.clone();
    }
    hud_state.settings_open = window_open;
}

fn draw_graphics_settings_tab(ui: &mut egui::Ui, draft: &mut GameSettings) {
    let graphics = &mut draft.graphics;
    choice(ui, "Window mode", &mut graphics.window_mode, WindowModeSetting::ALL, |mode| {
        mode.label()
    });
    choice(
        ui,
        "Resolution",
        &mut graphics.resolution,
        ResolutionSetting::presets().iter().copied(),
        ResolutionSetting::label,
    );
    choice(ui, "Shadows", &mut graphics.shadow_quality, ShadowQualitySetting::ALL, |quality| {
        quality.label()
    });
    choice(ui, "FPS limit", &mut graphics.fps_limit, FpsLimitSetting::ALL, |limit| {
        limit.label()
    });
    ui.checkbox(&mut graphics.vsync, "VSync");
}

fn draw_controls_settings_tab(ui: &mut egui::Ui, draft: &mut GameSettings) {
    let controls = &mut draft.controls;
    ui.checkbox(&mut controls.run_by_default, "Run by default");
    choice(ui, "Turning", &mut controls.turn_mode, TurnModeSetting::ALL, |mode| {
        mode.label()
    });
    ui.add_enabled(
        controls.turn_mode == TurnModeSetting::Smoothed,
        egui::Slider::new(&mut controls.turn_rate, 1.0..=30.0).text("Turn rate"),
    );
    ui.add(
        egui::Slider::new(&mut controls.orbit_sensitivity, 0.001..=0.02)
            .text("Orbit sensitivity"),
    );
    ui.add(egui::Slider::new(&mut controls.zoom_sensitivity, 0.1..=5.0).text("Zoom sensitivity"));

    ui.separator();
    let tuning = &mut draft.character;
    ui.add(egui::Slider::new(&mut tuning.walk_velocity, 10.0..=150.0).text("Walk speed"));
    ui.add(egui::Slider::new(&mut tuning.run_velocity, 20.0..=300.0).text("Run speed"));
}

/// Combo box over a fixed option list.
fn choice<T, L>(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut T,
    options: impl IntoIterator<Item = T>,
    name: impl Fn(T) -> L,
) where
    T: Copy + PartialEq,
    L: Into<egui::WidgetText>,
{
    egui::ComboBox::from_label(label)
        .selected_text(name(*value))
        .show_ui(ui, |ui| {
            for option in options {
                ui.selectable_value(value, option, name(option));
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui_app() -> App {
        let mut app = App::new();
        app.init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<HudUiState>()
            .init_resource::<InputGate>()
            .insert_resource(SettingsResource::new(GameSettings::default()))
            .add_systems(
                Update,
                (toggle_settings_modal_with_escape, sync_modal_input_gate).chain(),
            );
        app
    }

    #[test]
    fn escape_opens_modal_and_closes_gate() {
        let mut app = ui_app();
        app.world_mut().resource_mut::<InputGate>().loading = false;
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Escape);
        app.update();

        assert!(app.world().resource::<HudUiState>().settings_open());
        assert!(app.world().resource::<InputGate>().modal_open);
        assert!(!app.world().resource::<InputGate>().is_open());
    }

    #[test]
    fn second_escape_reopens_gate() {
        let mut app = ui_app();
        app.world_mut().resource_mut::<InputGate>().loading = false;
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Escape);
        app.update();

        {
            let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
            keys.release(KeyCode::Escape);
            keys.clear();
            keys.press(KeyCode::Escape);
        }
        app.update();

        assert!(!app.world().resource::<HudUiState>().settings_open());
        assert!(app.world().resource::<InputGate>().is_open());
    }
}
