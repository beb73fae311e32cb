use std::fs;

use serde::Deserialize;

use crate::error::{CgsrError, Result};
use crate::types::{Date, Duration, EndpointId, NodeID, Priority, Volume};

/// Deserialized shape of a simulation-input JSON document (§6): the horizon,
/// the network's satellites and gateways, the targets to be serviced, and the
/// traffic model driving request/bundle generation.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationInput {
    pub simulation: SimulationParams,
    #[serde(default)]
    pub satellites: Vec<NodeSpec>,
    #[serde(default)]
    pub gateways: Vec<NodeSpec>,
    #[serde(default)]
    pub targets: Vec<TargetSpec>,
    pub traffic: TrafficParams,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SimulationParams {
    pub date_start: Date,
    pub duration: Duration,
    pub step_size: Duration,
}

/// A network node (satellite relay or ground gateway). Gateways typically
/// share an `eid` with each other (anycast); satellites usually carry none.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NodeSpec {
    pub uid: NodeID,
    #[serde(default)]
    pub eid: Option<EndpointId>,
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: Volume,
}

fn default_buffer_capacity() -> Volume {
    1.0e9
}

/// A ground target whose data is collected by request (§3 "Target").
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TargetSpec {
    pub uid: NodeID,
}

/// Parameters driving the Poisson request/bundle generators (§6 congestion
/// control): every generated request asks for `size` units of data from a
/// randomly chosen target, at `priority`, with the given acquisition and
/// delivery deadlines relative to its creation time.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TrafficParams {
    pub size: Volume,
    pub priority: Priority,
    pub max_time_to_acquire: Duration,
    pub max_time_to_deliver: Duration,
    /// Fraction in (0, 1] of a target's download capacity requests are
    /// allowed to saturate; drives the mean request inter-arrival time.
    pub congestion: f64,
    /// Moderate Source Routing: pin bundles to the task's recorded route.
    #[serde(default)]
    pub msr: bool,
}

/// Loads and decodes a simulation-input JSON document from disk.
pub fn load_sim_input(path: &str) -> Result<SimulationInput> {
    let raw = fs::read_to_string(path).map_err(|e| CgsrError::SimInputIo {
        path: path.to_string(),
        source: e,
    })?;
    let input: SimulationInput = serde_json::from_str(&raw)?;
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_minimal_document() {
        let json = r#"{
            "simulation": {"date_start": 0.0, "duration": 100.0, "step_size": 1.0},
            "satellites": [{"uid": 1}],
            "gateways": [{"uid": 2, "eid": 99}],
            "targets": [{"uid": 9}],
            "traffic": {
                "size": 4.0,
                "priority": "normal",
                "max_time_to_acquire": 20.0,
                "max_time_to_deliver": 50.0,
                "congestion": 0.5
            }
        }"#;
        let input: SimulationInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.satellites.len(), 1);
        assert_eq!(input.gateways[0].eid, Some(99));
        assert_eq!(input.traffic.priority, Priority::Normal);
        assert!(!input.traffic.msr);
    }
}
