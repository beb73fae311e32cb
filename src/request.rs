use crate::types::{Date, Duration, EndpointId, NodeID, Priority, RequestId, Volume};

/// A call to collect and deliver data from a target, before it has been
/// scheduled into a [`crate::task::Task`]. Grounded on the source's
/// `Request` dataclass (`scheduling.py`).
#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone)]
pub struct Request {
    pub uid: RequestId,
    pub target_id: NodeID,
    pub target_lat: Option<f64>,
    pub target_lon: Option<f64>,
    pub target_alt: Option<f64>,
    pub deadline_acquire: Date,
    pub bundle_lifetime: Duration,
    pub priority: Priority,
    pub destination: EndpointId,
    pub data_volume: Volume,
    pub time_created: Date,
    pub status: RequestStatus,
}

#[cfg_attr(feature = "debug", derive(Debug))]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Initiated,
    Scheduled,
    Acquired,
    Delivered,
    Failed,
}

impl Request {
    pub fn new(
        uid: RequestId,
        target_id: NodeID,
        deadline_acquire: Date,
        bundle_lifetime: Duration,
        priority: Priority,
        destination: EndpointId,
        data_volume: Volume,
        time_created: Date,
    ) -> Self {
        Self {
            uid,
            target_id,
            target_lat: None,
            target_lon: None,
            target_alt: None,
            deadline_acquire,
            bundle_lifetime,
            priority,
            destination,
            data_volume,
            time_created,
            status: RequestStatus::Initiated,
        }
    }
}
