//! The scripted demo session

use marquee_core::Color;
use marquee_menu::{Direction, FrameData, FrameSource, Image, Menu};
use std::time::Duration;

const MOVIE: Duration = Duration::from_secs(5400);

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Navigate(Direction),
    ShowPlayback,
    Progress(Duration),
    Seek(Option<Duration>),
    HidePlayback,
    ShowOptions,
    StepOption(isize),
    HideOptions,
    OpenModal,
    CloseModal,
    Subtitle(Option<&'static str>),
    ShowLoader,
    HideLoader,
    ShowMetrics(bool),
    ShowConsole(bool),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub frame: u64,
    pub action: Action,
}

/// The demo sequence spread evenly over `frames`
pub fn demo(frames: u64) -> Vec<Step> {
    use Action::*;
    use Direction::*;

    let actions = [
        ShowMetrics(true),
        Navigate(Right),
        Navigate(Right),
        Navigate(Down),
        Navigate(Down),
        Navigate(Down),
        Navigate(Left),
        Navigate(Up),
        Navigate(Up),
        Navigate(Up),
        Navigate(Left),
        Navigate(Left),
        Navigate(Left),
        ShowLoader,
        HideLoader,
        ShowPlayback,
        Progress(Duration::from_secs(600)),
        Subtitle(Some("Where were we?")),
        Progress(Duration::from_secs(1200)),
        Seek(Some(Duration::from_secs(2400))),
        Seek(Some(Duration::from_secs(2410))),
        Seek(None),
        Subtitle(None),
        ShowOptions,
        StepOption(1),
        StepOption(1),
        HideOptions,
        HidePlayback,
        OpenModal,
        CloseModal,
        ShowConsole(true),
        ShowConsole(false),
        ShowMetrics(false),
    ];

    let slots = actions.len() as u64 + 1;
    actions
        .into_iter()
        .enumerate()
        .map(|(i, action)| Step {
            frame: i as u64 * frames / slots,
            action,
        })
        .collect()
}

pub fn apply(menu: &mut Menu, action: &Action) {
    match action {
        Action::Navigate(direction) => {
            if !menu.navigate(*direction) {
                tracing::debug!("{:?} hit the edge", direction);
            }
        }
        Action::ShowPlayback => menu.show_playback("Big Buck Bunny", "bbb", MOVIE),
        Action::Progress(position) => menu.set_progress(*position),
        Action::Seek(position) => menu.seek_preview(*position),
        Action::HidePlayback => menu.hide_playback(),
        Action::ShowOptions => menu.show_options(
            ["Audio", "Subtitles", "Quality", "Speed"]
                .map(String::from)
                .to_vec(),
            0,
        ),
        Action::StepOption(delta) => {
            menu.step_option(*delta);
        }
        Action::HideOptions => menu.hide_options(),
        Action::OpenModal => menu.open_modal(
            "Stop playback?",
            "Your progress is saved and you can resume from the same scene later.",
            vec!["Stop".to_string(), "Keep watching".to_string()],
        ),
        Action::CloseModal => menu.close_modal(),
        Action::Subtitle(text) => menu.set_subtitle(*text),
        Action::ShowLoader => menu.show_loader(),
        Action::HideLoader => menu.hide_loader(),
        Action::ShowMetrics(visible) => menu.show_metrics(*visible),
        Action::ShowConsole(visible) => menu.show_console(*visible),
    }
}

/// Storyboard of flat frames, one every `interval_secs`
pub struct Storyboard {
    interval: u64,
}

impl Storyboard {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval: interval_secs.max(1),
        }
    }
}

impl FrameSource for Storyboard {
    fn fetch_frame(&mut self, position: Duration, _id: &str) -> Option<FrameData> {
        let index = position.as_secs() / self.interval;
        let shade = (index % 16) as f32 / 15.0;
        let image = Image::solid(160, 90, Color::rgb(shade, 0.3, 1.0 - shade)).ok()?;
        Some(FrameData {
            image,
            position: Duration::from_secs(index * self.interval),
        })
    }
}
