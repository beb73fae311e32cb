use std::marker::PhantomData;

use crate::contact::Contact;
use crate::contact_plan::ContactPlan;
use crate::context::Context;
use crate::pathfinding::{dijkstra::earliest_arrival, SearchConstraint};
use crate::request::Request;
use crate::route::Route;
use crate::task::{Task, TaskStatus};
use crate::task_table::TaskTable;
use crate::types::{ContactId, Date, EndpointId, NodeID};

/// The five CGS feature-flag combinations the source's `Scheduler.__post_init__`
/// normalizes to (§9 "Dynamic dispatch"), expressed as a marker-type trait
/// rather than runtime booleans so the planner's hot path is monomorphized.
pub trait SchedulingProfile {
    /// Require a feasible acquisition path before `deadline_acquire`.
    const VALID_PICKUP: bool;
    /// Record the assignee and pickup time on the produced task.
    const DEFINE_PICKUP: bool;
    /// Require a feasible delivery path within `pickup_time + lifetime`.
    const VALID_DELIVERY: bool;
    /// Decrement `mav` along the delivery path at request time.
    const RESOURCE_AWARE: bool;
    /// Record the delivery route on the task (enables MSR downstream).
    const DEFINE_DELIVERY: bool;
}

/// All five flags on: the complete two-phase CGS planner.
pub struct FullCgs;
impl SchedulingProfile for FullCgs {
    const VALID_PICKUP: bool = true;
    const DEFINE_PICKUP: bool = true;
    const VALID_DELIVERY: bool = true;
    const RESOURCE_AWARE: bool = true;
    const DEFINE_DELIVERY: bool = true;
}

/// No pickup/delivery search at all: a task is stamped from the request as
/// soon as it arrives, with no assignee. Corresponds to `valid_pickup=false`,
/// which the source's `__post_init__` cascades into disabling every other
/// flag.
pub struct AssignOnly;
impl SchedulingProfile for AssignOnly {
    const VALID_PICKUP: bool = false;
    const DEFINE_PICKUP: bool = false;
    const VALID_DELIVERY: bool = false;
    const RESOURCE_AWARE: bool = false;
    const DEFINE_DELIVERY: bool = false;
}

/// Only require and record an acquisition path; delivery is left to the
/// per-node forwarding engine's own CGR search once the bundle exists.
pub struct PickupOnly;
impl SchedulingProfile for PickupOnly {
    const VALID_PICKUP: bool = true;
    const DEFINE_PICKUP: bool = true;
    const VALID_DELIVERY: bool = false;
    const RESOURCE_AWARE: bool = false;
    const DEFINE_DELIVERY: bool = false;
}

/// Require both a pickup and a delivery path to exist (so an infeasible
/// request still fails fast), but don't commit the delivery route to the
/// task or reserve its resources — forwarding decides the actual route later.
pub struct PickupAndDeliveryValidated;
impl SchedulingProfile for PickupAndDeliveryValidated {
    const VALID_PICKUP: bool = true;
    const DEFINE_PICKUP: bool = true;
    const VALID_DELIVERY: bool = true;
    const RESOURCE_AWARE: bool = false;
    const DEFINE_DELIVERY: bool = false;
}

/// Full CGS except the assignee/pickup time are not committed to the task:
/// resources are reserved and the delivery route is recorded, but which node
/// actually performs the acquisition is left open (e.g. speculative resource
/// accounting ahead of a separate assignment decision).
pub struct ResourceAwareNoDefine;
impl SchedulingProfile for ResourceAwareNoDefine {
    const VALID_PICKUP: bool = true;
    const DEFINE_PICKUP: bool = false;
    const VALID_DELIVERY: bool = true;
    const RESOURCE_AWARE: bool = true;
    const DEFINE_DELIVERY: bool = true;
}

/// Turns requests into tasks via the two-phase CGS search (§4.5), generic
/// over the profile selecting which of the five flag combinations applies.
pub struct Scheduler<P: SchedulingProfile> {
    _profile: PhantomData<P>,
}

impl<P: SchedulingProfile> Default for Scheduler<P> {
    fn default() -> Self {
        Self {
            _profile: PhantomData,
        }
    }
}

impl<P: SchedulingProfile> Scheduler<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to schedule `request` into a [`Task`]. `node_endpoint` maps a
    /// node to the endpoint it carries (gateways share one anycast id, §6);
    /// target nodes are treated as carrying an endpoint equal to their own
    /// id, since a request names a target *node*, not an endpoint.
    pub fn schedule_task(
        &self,
        scheduler_node: NodeID,
        request: &Request,
        now: Date,
        plan: &mut ContactPlan,
        target_overlay: &[Contact],
        node_endpoint: impl Fn(NodeID) -> Option<EndpointId> + Copy,
        ctx: &mut Context,
    ) -> Option<Task> {
        if !P::VALID_PICKUP {
            return Some(self.finish(request, now, scheduler_node, None, None, None, None, None, ctx));
        }

        let mut working = ContactPlan::new(
            plan.contacts()
                .iter()
                .cloned()
                .chain(
                    target_overlay
                        .iter()
                        .filter(|c| c.to == request.target_id)
                        .cloned(),
                )
                .collect(),
        );

        let target_endpoint = request.target_id as EndpointId;
        let to_target = move |n: NodeID| -> Option<EndpointId> {
            if n == request.target_id {
                Some(target_endpoint)
            } else {
                None
            }
        };

        if !P::VALID_DELIVERY {
            let constraint = SearchConstraint {
                deadline: Some(request.deadline_acquire),
                ..SearchConstraint::new()
            };
            let acq = earliest_arrival(&mut working, scheduler_node, now, to_target, target_endpoint, constraint)?;
            let assignee = P::DEFINE_PICKUP.then(|| acq.hops().last().unwrap().frm);
            let pickup_time = P::DEFINE_PICKUP.then(|| acq.best_delivery_time());
            let acq_path = P::DEFINE_PICKUP.then(|| ids_of(&acq));
            return Some(self.finish(request, now, scheduler_node, assignee, pickup_time, None, acq_path, None, ctx));
        }

        let (path_acq, path_del) = self.cgs_routing(
            scheduler_node,
            request,
            now,
            &mut working,
            to_target,
            target_endpoint,
            node_endpoint,
        )?;

        if P::RESOURCE_AWARE {
            for hop in path_del.hops() {
                if let Some(idx) = plan.index_of(&hop.id()) {
                    plan.contact_mut(idx).reserve(request.priority, request.data_volume);
                }
            }
        }

        let assignee = P::DEFINE_PICKUP.then(|| path_del.hops()[0].frm);
        let pickup_time = P::DEFINE_PICKUP.then(|| path_acq.best_delivery_time());
        let acq_path = P::DEFINE_PICKUP.then(|| ids_of(&path_acq));
        let delivery_time = P::DEFINE_DELIVERY.then(|| path_del.best_delivery_time());
        let del_path = P::DEFINE_DELIVERY.then(|| ids_of(&path_del));

        Some(self.finish(
            request,
            now,
            scheduler_node,
            assignee,
            pickup_time,
            delivery_time,
            acq_path,
            del_path,
            ctx,
        ))
    }

    /// Two-phase search (§4.5 steps 2-5): repeatedly finds the next-best
    /// acquisition opportunity and, for each, the best delivery path onward,
    /// keeping the pair that minimizes an adjusted best-delivery-time that
    /// also accounts for per-hop transfer time.
    fn cgs_routing(
        &self,
        src: NodeID,
        request: &Request,
        now: Date,
        working: &mut ContactPlan,
        to_target: impl Fn(NodeID) -> Option<EndpointId> + Copy,
        target_endpoint: EndpointId,
        node_endpoint: impl Fn(NodeID) -> Option<EndpointId> + Copy,
    ) -> Option<(Route, Route)> {
        working.clear_management_working_area();

        let mut best: Option<(Route, Route)> = None;
        let mut earliest_delivery = Date::INFINITY;

        loop {
            let acq_constraint = SearchConstraint {
                deadline: Some(request.deadline_acquire),
                ..SearchConstraint::new()
            };
            let Some(path_acq) = earliest_arrival(working, src, now, to_target, target_endpoint, acq_constraint)
            else {
                break;
            };
            if path_acq.best_delivery_time() >= earliest_delivery {
                break;
            }

            let acquirer = path_acq.hops().last().unwrap().frm;
            for c in working.contacts_mut() {
                if c.frm == acquirer && c.to == request.target_id {
                    c.suppressed = true;
                }
            }

            let del_constraint = SearchConstraint {
                deadline: Some(path_acq.best_delivery_time() + request.bundle_lifetime),
                size: Some(request.data_volume),
                priority: request.priority,
                ..SearchConstraint::new()
            };
            let Some(path_del) = earliest_arrival(
                working,
                acquirer,
                path_acq.best_delivery_time(),
                node_endpoint,
                request.destination,
                del_constraint,
            ) else {
                continue;
            };

            let transfer_time: Date = path_del
                .hops()
                .iter()
                .map(|c| c.owlt + c.rate * request.data_volume)
                .sum();
            let current_bdt = path_del
                .best_delivery_time()
                .max(path_acq.best_delivery_time() + transfer_time);

            if current_bdt < earliest_delivery {
                earliest_delivery = current_bdt;
                best = Some((path_acq, path_del));
            }
        }

        best
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        request: &Request,
        now: Date,
        scheduled_by: NodeID,
        assignee: Option<NodeID>,
        pickup_time: Option<Date>,
        delivery_time: Option<Date>,
        acq_path: Option<Vec<ContactId>>,
        del_path: Option<Vec<ContactId>>,
        ctx: &mut Context,
    ) -> Task {
        let uid = ctx.ids.next_task_id();
        let mut task = Task::new(
            uid.clone(),
            request.target_id,
            request.destination,
            request.priority,
            request.data_volume,
            request.bundle_lifetime,
            request.deadline_acquire,
            now,
            scheduled_by,
        );
        task.assignee = assignee;
        task.pickup_time = pickup_time;
        task.delivery_time = delivery_time;
        task.acq_path = acq_path;
        task.del_path = del_path;
        task.request_ids.push(request.uid.clone());

        ctx.analytics.add_task(&uid);
        task
    }
}

fn ids_of(route: &Route) -> Vec<ContactId> {
    route.hops().iter().map(|c| c.id()).collect()
}

/// Request deduplication (§4.5 last bullet, optional): if a pending task
/// already targets this request's target with a pickup time no earlier than
/// the request's arrival, attach the request to that task instead of
/// scheduling a new one.
pub fn find_duplicate_task<'a>(table: &'a TaskTable, request: &Request) -> Option<&'a Task> {
    table.iter().find(|t| {
        t.status == TaskStatus::Pending
            && t.target == request.target_id
            && t.pickup_time.map(|p| p >= request.time_created).unwrap_or(true)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::Contact;
    use crate::types::{Priority, RequestId};

    fn request(target: NodeID, destination: EndpointId, deadline: Date) -> Request {
        Request::new(
            RequestId("R".into()),
            target,
            deadline,
            100.0,
            Priority::Normal,
            destination,
            4.0,
            0.0,
        )
    }

    #[test]
    fn full_cgs_schedules_pickup_and_delivery() {
        let mut plan = ContactPlan::new(vec![
            Contact::new(1, 2, 10.0, 20.0, 1.0, 0.0, 1.0).unwrap(),
            Contact::new(2, 3, 20.0, 30.0, 1.0, 0.0, 1.0).unwrap(),
        ]);
        let overlay = vec![Contact::new(2, 9, 5.0, 30.0, 1.0, 0.0, 1.0).unwrap()];
        let mut ctx = Context::new(1);
        let scheduler: Scheduler<FullCgs> = Scheduler::new();

        // destination endpoint 3 is carried only by node 3.
        let req = request(9, 3, 50.0);
        let task = scheduler
            .schedule_task(1, &req, 0.0, &mut plan, &overlay, |n| if n == 3 { Some(3) } else { None }, &mut ctx)
            .unwrap();

        assert_eq!(task.assignee, Some(2));
        assert_eq!(task.pickup_time, Some(10.0));
        assert_eq!(task.del_path.as_ref().unwrap().len(), 1);
        assert_eq!(task.delivery_time, Some(20.0));
    }

    #[test]
    fn assign_only_skips_routing_entirely() {
        let mut plan = ContactPlan::new(vec![]);
        let mut ctx = Context::new(1);
        let scheduler: Scheduler<AssignOnly> = Scheduler::new();
        let req = request(9, 2, 50.0);
        let task = scheduler
            .schedule_task(1, &req, 0.0, &mut plan, &[], |_| None, &mut ctx)
            .unwrap();
        assert_eq!(task.assignee, None);
        assert_eq!(task.acq_path, None);
    }

    #[test]
    fn infeasible_request_yields_no_task() {
        let mut plan = ContactPlan::new(vec![]);
        let mut ctx = Context::new(1);
        let scheduler: Scheduler<FullCgs> = Scheduler::new();
        let req = request(9, 2, 50.0);
        let task = scheduler.schedule_task(1, &req, 0.0, &mut plan, &[], |_| None, &mut ctx);
        assert!(task.is_none());
    }
}
