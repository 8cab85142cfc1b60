//! The packing workflow template.
//!
//! One order type ships from this facility, so the step sequence is fixed at
//! build time. Only the item-verification checklist varies: it is derived
//! from the order's lines when a session is created.

use crate::orders::Order;
use crate::packout::step::{ChecklistItem, PackoutStep};

fn make_step(
    id: u32,
    title: &str,
    description: &str,
    photo_required: bool,
    instructions: &[&str],
    checklist: Vec<ChecklistItem>,
) -> PackoutStep {
    let mut step = PackoutStep {
        id,
        title: title.to_string(),
        description: description.to_string(),
        required: true,
        photo_required,
        instructions: instructions.iter().map(|s| s.to_string()).collect(),
        checklist,
        photo_taken: false,
        photo_ref: None,
        completed: false,
    };
    step.recompute();
    step
}

fn checklist(texts: &[&str]) -> Vec<ChecklistItem> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| ChecklistItem::new((i + 1) as u32, *text))
        .collect()
}

/// Checklist for the item-verification step: one entry per order line plus a
/// closing quantity check.
fn verification_checklist(order: &Order) -> Vec<ChecklistItem> {
    let mut items: Vec<ChecklistItem> = order
        .items
        .iter()
        .enumerate()
        .map(|(i, line)| {
            ChecklistItem::new(
                (i + 1) as u32,
                format!("{} x {} ({})", line.quantity, line.name, line.sku),
            )
        })
        .collect();
    items.push(ChecklistItem::new(
        (items.len() + 1) as u32,
        "Quantities match the packing list",
    ));
    items
}

/// Instantiate the five-step packing sequence for an order
pub fn steps_for_order(order: &Order) -> Vec<PackoutStep> {
    vec![
        make_step(
            1,
            "Verify items",
            "Confirm every line of the order is present and undamaged",
            false,
            &[
                "Pull the pick tote for this order",
                "Match each item against the packing list",
                "Set aside any unit that looks damaged",
            ],
            verification_checklist(order),
        ),
        make_step(
            2,
            "Inspect condition",
            "Check units for damage before they go into the carton",
            true,
            &[
                "Look for dents, tears, and broken seals",
                "Photograph anything questionable before packing it",
            ],
            checklist(&["No damage or tampering found"]),
        ),
        make_step(
            3,
            "Pack carton",
            "Pack items securely in the right-sized carton",
            true,
            &[
                "Choose the smallest carton that fits the order",
                "Place heavier items at the bottom",
                "Add void fill so nothing shifts",
            ],
            checklist(&[
                "Correct carton size selected",
                "Void fill added around items",
            ]),
        ),
        make_step(
            4,
            "Seal and label",
            "Seal the carton and apply the shipping label",
            true,
            &[
                "Tape every seam",
                "Apply the label flat on the largest face",
            ],
            checklist(&[
                "Carton sealed on all seams",
                "Shipping label applied and legible",
            ]),
        ),
        make_step(
            5,
            "Final check and stage",
            "Confirm the package is ready and stage it for pickup",
            true,
            &[
                "Scan the label to confirm it reads",
                "Place the carton in the outbound lane for its carrier",
            ],
            checklist(&[
                "Label barcode scans cleanly",
                "Carton staged in the outbound lane",
            ]),
        ),
    ]
}
