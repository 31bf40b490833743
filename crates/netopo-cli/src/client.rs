//! Blocking client for a running graph API server (`netopo graph ...`).
//!
//! This is the editor side of the persistence contract: push a full graph
//! snapshot (create or update), fetch, list, delete, and set the minimum
//! consumption on its own.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::{json, Value};
use url::Url;

pub(crate) struct GraphClient {
    base: Url,
    http: Client,
}

impl GraphClient {
    pub(crate) fn new(server: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(server).map_err(|e| anyhow!("invalid --server `{server}`: {e}"))?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("failed to build http client: {e}"))?;
        Ok(Self { base, http })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| anyhow!("invalid request path `{path}`: {e}"))
    }

    /// Send a request and unwrap the `{success, ...}` envelope.
    fn send(&self, request: RequestBuilder) -> Result<Value> {
        let resp = request
            .send()
            .map_err(|e| anyhow!("failed to reach graph server at {} ({e})", self.base))?;
        let status = resp.status();
        let body: Value = resp
            .json()
            .map_err(|e| anyhow!("graph server returned non-JSON ({status}): {e}"))?;
        if !status.is_success() || body.get("success") != Some(&Value::Bool(true)) {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(anyhow!("graph server error {status}: {message}"));
        }
        Ok(body)
    }

    pub(crate) fn list(&self, game_type: Option<&str>) -> Result<Value> {
        let mut url = self.url("api/graphs")?;
        if let Some(mode) = game_type {
            url.query_pairs_mut().append_pair("gameType", mode);
        }
        self.send(self.http.get(url))
    }

    pub(crate) fn get(&self, id: &str) -> Result<Value> {
        self.send(self.http.get(self.url(&format!("api/graphs/{id}"))?))
    }

    pub(crate) fn create(&self, body: &Value) -> Result<Value> {
        self.send(self.http.post(self.url("api/graphs")?).json(body))
    }

    pub(crate) fn update(&self, id: &str, body: &Value) -> Result<Value> {
        self.send(self.http.put(self.url(&format!("api/graphs/{id}"))?).json(body))
    }

    pub(crate) fn delete(&self, id: &str) -> Result<Value> {
        self.send(self.http.delete(self.url(&format!("api/graphs/{id}"))?))
    }

    pub(crate) fn set_minimum_consumption(&self, id: &str, value: f64) -> Result<Value> {
        let url = self.url(&format!("api/graphs/{id}/minimumConsumption"))?;
        self.send(self.http.patch(url).json(&json!({ "minimumConsumption": value })))
    }
}

pub(crate) fn cmd_graph(server: &str, timeout_secs: u64, command: crate::GraphCommands) -> Result<()> {
    use crate::GraphCommands;

    let client = GraphClient::new(server, Duration::from_secs(timeout_secs.max(1)))?;
    let out = match command {
        GraphCommands::List { game_type } => {
            let body = client.list(game_type.as_deref())?;
            print_listing(&body);
            return Ok(());
        }
        GraphCommands::Get { id } => client.get(&id)?,
        GraphCommands::Push { input, id } => {
            let body = read_body(&input)?;
            match id {
                Some(id) => client.update(&id, &body)?,
                None => client.create(&body)?,
            }
        }
        GraphCommands::Delete { id } => client.delete(&id)?,
        GraphCommands::SetMinimum { id, value } => client.set_minimum_consumption(&id, value)?,
    };

    if let Some(message) = out.get("message").and_then(Value::as_str) {
        eprintln!("{} {message}", "ok".green().bold());
    }
    if let Some(data) = out.get("data") {
        println!("{}", serde_json::to_string_pretty(data)?);
    }
    Ok(())
}

fn read_body(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn print_listing(body: &Value) {
    let graphs = body.get("data").and_then(Value::as_array);
    let count = body.get("count").and_then(Value::as_u64).unwrap_or(0);
    eprintln!("{} {count} graph(s)", "ok".green().bold());
    for graph in graphs.into_iter().flatten() {
        let field = |key: &str| graph.get(key).and_then(Value::as_str).unwrap_or("?").to_string();
        let consumption = graph
            .pointer("/metrics/totalConsumption")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        println!(
            "{}  {:<6} {:<24} consumption={consumption}",
            field("_id").bold(),
            field("mode"),
            field("name")
        );
    }
}
