use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use serde::Serialize;
use std::fs::{create_dir_all, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::payload::{BacktestRequest, CreateBotRequest, EntryOrder};

#[derive(Debug, Serialize, Clone)]
pub struct LadderRecord {
    pub timestamp: String,
    pub kind: String, // BOT, BACKTEST, REVERSE
    pub request_id: Option<String>,
    pub symbol: String,
    pub direction: String,
    pub step: u32,
    pub price: f64,
    pub amount: f64,
    pub entry_type: String,
    pub notes: Option<String>,
}

/// Appends every submitted ladder step to `ladders.csv`.
#[derive(Clone)]
pub struct LadderAuditLogger {
    writer: Arc<Mutex<Writer<std::fs::File>>>,
}

impl LadderAuditLogger {
    pub fn new(log_dir: &str) -> Result<Self> {
        let dir = Path::new(log_dir);
        create_dir_all(dir).context("Failed to create log directory")?;

        let file_path = dir.join("ladders.csv");
        let file_exists = file_path.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .context("Failed to open ladders.csv")?;

        let writer = csv::WriterBuilder::new()
            .has_headers(!file_exists)
            .from_writer(file);

        Ok(Self {
            writer: Arc::new(Mutex::new(writer)),
        })
    }

    pub fn log(&self, record: LadderRecord) {
        if let Ok(mut w) = self.writer.lock() {
            if let Err(e) = w.serialize(record) {
                log::error!("Failed to write ladder audit log: {}", e);
            } else {
                let _ = w.flush();
            }
        }
    }

    fn log_orders(
        &self,
        kind: &str,
        request_id: Option<String>,
        symbol: &str,
        direction: &str,
        orders: &[EntryOrder],
        notes: Option<String>,
    ) {
        let timestamp = Local::now().to_rfc3339();
        for order in orders {
            self.log(LadderRecord {
                timestamp: timestamp.clone(),
                kind: kind.to_string(),
                request_id: request_id.clone(),
                symbol: symbol.to_string(),
                direction: direction.to_string(),
                step: order.step,
                price: order.price,
                amount: order.amount,
                entry_type: order.entry_type.to_string(),
                notes: notes.clone(),
            });
        }
    }

    pub fn log_bot_request(&self, request: &CreateBotRequest) {
        let id = Some(request.metadata.client_request_id.to_string());
        self.log_orders(
            "BOT",
            id.clone(),
            &request.basic.symbol,
            &request.basic.direction.to_string(),
            &request.entries,
            Some(format!("leverage {}x", request.basic.leverage)),
        );
        if let Some(reverse) = &request.reverse {
            self.log_orders(
                "REVERSE",
                id,
                &request.basic.symbol,
                &reverse.direction.to_string(),
                &reverse.entries,
                Some(format!("opens at step {}", reverse.creation_step)),
            );
        }
    }

    pub fn log_backtest_request(&self, request: &BacktestRequest) {
        self.log_orders(
            "BACKTEST",
            None,
            &request.basic.symbol,
            &request.basic.direction.to_string(),
            &request.entries,
            Some(format!("{} minutes", request.testing_period)),
        );
    }
}
