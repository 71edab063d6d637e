//! Button display fed from the `/power-status` endpoint.
//!
//! A display surface shows three wattage lines and one of two states: surplus when the inverter
//! generates more than the house draws, deficit otherwise.

mod client;
mod poller;

pub use client::{DeckError, StatusClient};
pub use poller::Poller;

use crate::model::PowerStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Deficit = 0,
    Surplus = 1,
}

impl From<&PowerStatus> for ButtonState {
    fn from(status: &PowerStatus) -> Self {
        if status.summary.is_generating && status.summary.net_load < 0.0 {
            ButtonState::Surplus
        } else {
            ButtonState::Deficit
        }
    }
}

/// Something that can show a title and a state, e.g. one key of a button deck.
pub trait Surface: Send + Sync {
    fn set_title(&self, title: &str);
    fn set_state(&self, state: ButtonState);
}

/// Surface that writes every update to the log.
pub struct LogSurface {
    name: String,
}

impl LogSurface {
    pub fn new(name: impl Into<String>) -> Self {
        LogSurface { name: name.into() }
    }
}

impl Surface for LogSurface {
    fn set_title(&self, title: &str) {
        log::info!("[{}] {}", self.name, title.replace('\n', " | "));
    }

    fn set_state(&self, state: ButtonState) {
        log::info!("[{}] state {:?}", self.name, state);
    }
}

/// Vendor values are deciwatts; show watts with one decimal.
fn watts(deciwatts: f64) -> String {
    format!("{:.1}", deciwatts / 10.0)
}

pub fn format_title(status: &PowerStatus) -> String {
    format!(
        "☀️{}W\n🔌{}W\n⚡{}W",
        watts(status.generation.current),
        watts(status.consumption.total),
        watts(status.summary.net_load)
    )
}

/// Short title for a failed poll; has to fit on a key.
pub fn error_title(error: &DeckError) -> &'static str {
    match error {
        DeckError::Offline(_) => "API\nServer\nOffline",
        DeckError::Timeout => "API\nTimeout",
        DeckError::NoResponse(_) => "No\nResponse",
        _ => "Connection\nError",
    }
}

/// Poll once and render the outcome on `surface`.
pub async fn refresh(client: &StatusClient, surface: &dyn Surface) {
    match client.power_status().await {
        Ok(status) => {
            surface.set_title(&format_title(&status));
            surface.set_state(ButtonState::from(&status));

            log::debug!(
                "Updated power data: Gen={}W, Load={}W, Net={}W",
                status.generation.current,
                status.consumption.total,
                status.summary.net_load
            );
        }
        Err(e) => {
            log::error!("Failed to get power status: {}", e);
            surface.set_title(error_title(&e));
            surface.set_state(ButtonState::Deficit);
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::{error_title, format_title, ButtonState, DeckError, Surface};
    use crate::model::{InverterQuota, PowerStatus};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingSurface {
        pub titles: Mutex<Vec<String>>,
        pub states: Mutex<Vec<ButtonState>>,
    }

    impl RecordingSurface {
        pub fn last_title(&self) -> Option<String> {
            self.titles.lock().unwrap().last().cloned()
        }

        pub fn last_state(&self) -> Option<ButtonState> {
            self.states.lock().unwrap().last().copied()
        }

        pub fn updates(&self) -> usize {
            self.titles.lock().unwrap().len()
        }
    }

    impl Surface for RecordingSurface {
        fn set_title(&self, title: &str) {
            self.titles.lock().unwrap().push(title.to_string());
        }

        fn set_state(&self, state: ButtonState) {
            self.states.lock().unwrap().push(state);
        }
    }

    pub fn status(generation: f64, permanent_watt: f64) -> PowerStatus {
        let quota = InverterQuota {
            generation,
            permanent_watt,
            ..InverterQuota::default()
        };
        PowerStatus::new("HW51".to_string(), quota, vec![], chrono::Utc::now())
    }

    #[test]
    fn title_in_watts() {
        assert_eq!("☀️450.0W\n🔌350.0W\n⚡-100.0W", format_title(&status(4500.0, 3500.0)));
        assert_eq!("☀️0.0W\n🔌12.3W\n⚡12.3W", format_title(&status(0.0, 123.0)));
    }

    #[test]
    fn surplus_state() {
        assert_eq!(ButtonState::Surplus, ButtonState::from(&status(4500.0, 3500.0)));
        assert_eq!(1, ButtonState::Surplus as u8);
    }

    #[test]
    fn deficit_state() {
        assert_eq!(ButtonState::Deficit, ButtonState::from(&status(3500.0, 4500.0)));
        assert_eq!(ButtonState::Deficit, ButtonState::from(&status(3500.0, 3500.0)));
        assert_eq!(ButtonState::Deficit, ButtonState::from(&status(0.0, 0.0)));
        assert_eq!(0, ButtonState::Deficit as u8);
    }

    #[test]
    fn error_titles() {
        assert_eq!(
            "API\nServer\nOffline",
            error_title(&DeckError::Offline("refused".to_string()))
        );
        assert_eq!("API\nTimeout", error_title(&DeckError::Timeout));
        assert_eq!(
            "No\nResponse",
            error_title(&DeckError::NoResponse("reset".to_string()))
        );
        assert_eq!(
            "Connection\nError",
            error_title(&DeckError::Api {
                status: 500,
                message: "No devices found for the account.".to_string()
            })
        );
    }
}
