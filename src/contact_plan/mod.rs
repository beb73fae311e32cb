use std::collections::HashMap;

use crate::contact::Contact;
use crate::error::{CgsrError, Result};
use crate::parsing::{Lexer, ParsingState};
use crate::types::{Date, DataRate, NodeID, Token};

pub mod from_file;

/// The deterministic list of all contacts over a simulated horizon, plus the
/// per-node outgoing adjacency used to expand a Dijkstra search frontier.
///
/// Grounded on §9 "Container choices": a sorted `Vec<Contact>` with a
/// `HashMap<NodeID, Vec<usize>>` adjacency of indices into it, rather than the
/// teacher's `Multigraph` of `Rc<RefCell<...>>` sender/receiver node maps.
#[cfg_attr(feature = "debug", derive(Debug))]
pub struct ContactPlan {
    contacts: Vec<Contact>,
    outgoing: HashMap<NodeID, Vec<usize>>,
}

impl ContactPlan {
    pub fn new(mut contacts: Vec<Contact>) -> Self {
        contacts.sort();
        let mut outgoing: HashMap<NodeID, Vec<usize>> = HashMap::new();
        for (idx, c) in contacts.iter().enumerate() {
            outgoing.entry(c.frm).or_default().push(idx);
        }
        Self { contacts, outgoing }
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn contact(&self, idx: usize) -> &Contact {
        &self.contacts[idx]
    }

    pub fn contact_mut(&mut self, idx: usize) -> &mut Contact {
        &mut self.contacts[idx]
    }

    pub fn contacts_mut(&mut self) -> impl Iterator<Item = &mut Contact> {
        self.contacts.iter_mut()
    }

    /// Locates a contact by its stable id. Used by the scheduler to reserve
    /// volume on the live plan after a search ran against a temporary working
    /// copy (see `scheduler::cgs_routing`).
    pub fn index_of(&self, id: &crate::types::ContactId) -> Option<usize> {
        self.contacts.iter().position(|c| c.id() == *id)
    }

    /// Indices of every contact transmitted by `node`, in `(start)` order.
    pub fn outgoing(&self, node: NodeID) -> &[usize] {
        self.outgoing.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Appends a contact to the plan (e.g. a target-contact overlay entry)
    /// and reindexes the adjacency.
    pub fn insert(&mut self, contact: Contact) -> usize {
        let idx = self.contacts.len();
        self.outgoing.entry(contact.frm).or_default().push(idx);
        self.contacts.push(contact);
        idx
    }

    pub fn clear_dijkstra_working_area(&mut self) {
        for c in &mut self.contacts {
            c.clear_dijkstra_working_area();
        }
    }

    pub fn clear_management_working_area(&mut self) {
        for c in &mut self.contacts {
            c.clear_management_working_area();
        }
    }

    /// Removes every contact whose `end` has already passed, dropping it
    /// from both the plan and the adjacency it was indexed under.
    ///
    /// Indices handed out before this call are invalidated; callers that
    /// cache indices (the route cache) must drop their cache alongside.
    pub fn prune_expired(&mut self, now: Date) {
        self.contacts.retain(|c| c.end > now);
        self.outgoing.clear();
        for (idx, c) in self.contacts.iter().enumerate() {
            self.outgoing.entry(c.frm).or_default().push(idx);
        }
    }
}

fn parse_field<T>(lexer: &mut dyn Lexer) -> Result<T>
where
    T: Token<T>,
{
    match T::parse(lexer) {
        ParsingState::Finished(v) => Ok(v),
        ParsingState::Error(msg) => Err(CgsrError::ContactPlanParse(msg)),
        ParsingState::EOF => Err(CgsrError::ContactPlanParse(format!(
            "unexpected end of input ({})",
            lexer.get_current_position()
        ))),
    }
}

/// Parses the `a contact start end frm to rate owlt` grammar (§6) from any
/// [`Lexer`], ignoring lines that don't start with the `a contact` marker.
pub fn parse_contact_plan(lexer: &mut dyn Lexer) -> Result<ContactPlan> {
    let mut contacts = Vec::new();

    loop {
        let marker = match lexer.consume_next_token() {
            ParsingState::Finished(tok) => tok,
            ParsingState::EOF => break,
            ParsingState::Error(msg) => return Err(CgsrError::ContactPlanParse(msg)),
        };
        if marker != "a" {
            continue;
        }
        match lexer.consume_next_token() {
            ParsingState::Finished(kind) if kind == "contact" => {}
            ParsingState::Finished(_) => continue,
            ParsingState::EOF => break,
            ParsingState::Error(msg) => return Err(CgsrError::ContactPlanParse(msg)),
        }

        let start: Date = parse_field(lexer)?;
        let end: Date = parse_field(lexer)?;
        let frm: NodeID = parse_field(lexer)?;
        let to: NodeID = parse_field(lexer)?;
        let rate: DataRate = parse_field(lexer)?;
        let owlt: Date = parse_field(lexer)?;

        match Contact::new(frm, to, start, end, rate, owlt, 1.0) {
            Some(c) => contacts.push(c),
            None => {
                return Err(CgsrError::ContactPlanParse(format!(
                    "contact window must satisfy start < end ({})",
                    lexer.get_current_position()
                )))
            }
        }
    }

    Ok(ContactPlan::new(contacts))
}
