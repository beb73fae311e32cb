use cgsr::contact_plan::from_file::load_contact_plan;

fn main() {
    let plan = load_contact_plan("demos/contact_plan_ingest/sample.cp").unwrap();
    println!("parsed {} contacts", plan.contacts().len());

    for c in plan.contacts() {
        println!(
            "{} -> {}: [{}, {}] at {} bytes/s, owlt {}",
            c.frm, c.to, c.start, c.end, c.rate, c.owlt
        );
    }

    println!("outgoing from node 3: {:?}", plan.outgoing(3));
}
