use cgsr::contact::Contact;
use cgsr::contact_plan::ContactPlan;
use cgsr::context::Context;
use cgsr::request::Request;
use cgsr::scheduler::{FullCgs, Scheduler};
use cgsr::types::{Priority, RequestId};

fn main() {
    // A ground station (1) relays through a satellite (2) down to a gateway
    // (3), which acquires data from a target (9) on an earlier overlay pass.
    let mut plan = ContactPlan::new(vec![
        Contact::new(1, 2, 10.0, 20.0, 1.0e6, 0.1, 1.0).unwrap(),
        Contact::new(2, 3, 20.0, 30.0, 1.0e6, 0.1, 1.0).unwrap(),
    ]);
    let target_overlay = vec![Contact::new(2, 9, 5.0, 30.0, 1.0e6, 0.1, 1.0).unwrap()];

    let request = Request::new(
        RequestId("demo-1".into()),
        9,     // target
        50.0,  // deadline to acquire
        100.0, // bundle lifetime
        Priority::Normal,
        3,     // destination endpoint, carried by node 3
        4.0,   // data volume
        0.0,   // created at
    );

    let mut ctx = Context::new(1);
    let scheduler: Scheduler<FullCgs> = Scheduler::new();

    let task = scheduler
        .schedule_task(1, &request, 0.0, &mut plan, &target_overlay, |n| if n == 3 { Some(3) } else { None }, &mut ctx)
        .expect("request is feasible");

    println!("scheduled task {:?}", task.uid);
    println!("assignee: {:?}", task.assignee);
    println!("pickup time: {:?}", task.pickup_time);
    println!("delivery time: {:?}", task.delivery_time);
}
