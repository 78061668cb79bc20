use crate::dashboard::{Dashboard, Message, Task};

use data::config::Config;
use provider::polygon;
use tokio::sync::mpsc;

/// Owns the dashboard and executes its emitted tasks on the tokio
/// runtime. The embedding frontend drives the loop: user interaction
/// goes in through [`Session::dispatch`], and every message received on
/// the returned channel is fed back the same way, after which the
/// frontend re-reads [`Session::dashboard`] to render.
pub struct Session {
    dashboard: Dashboard,
    api_key: String,
    tx: mpsc::UnboundedSender<Message>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no Polygon API key configured; set POLYGON_API_KEY or api_key in config.json")]
    MissingApiKey,
    #[error(transparent)]
    Config(#[from] data::config::Error),
}

impl Session {
    pub fn new(api_key: String) -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();

        (
            Self {
                dashboard: Dashboard::new(),
                api_key,
                tx,
            },
            rx,
        )
    }

    /// Builds a session from the config file, with the environment
    /// overriding the stored API key.
    pub fn from_config() -> Result<(Self, mpsc::UnboundedReceiver<Message>), SessionError> {
        let config = Config::load()?;
        let api_key = config
            .resolved_api_key()
            .ok_or(SessionError::MissingApiKey)?;

        Ok(Self::new(api_key))
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn dispatch(&mut self, message: Message) {
        for task in self.dashboard.update(message) {
            self.spawn(task);
        }
    }

    fn spawn(&self, task: Task) {
        let api_key = self.api_key.clone();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let message = match task {
                Task::FetchBars(request) => {
                    let result =
                        polygon::fetch_price_bars(&api_key, request.ticker, request.range).await;
                    Message::BarsFetched {
                        ticker: request.ticker,
                        generation: request.generation,
                        result,
                    }
                }
                Task::FetchPage(request) => {
                    let result =
                        polygon::fetch_stock_page(&api_key, request.cursor.as_deref()).await;
                    Message::PageFetched {
                        cursor: request.cursor,
                        result,
                    }
                }
            };

            if tx.send(message).is_err() {
                log::debug!("Session receiver dropped; discarding completion");
            }
        });
    }
}
