//! Prints the expansion of one token for one field

use cronexpand::FIELDS;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    match (args.get(1), args.get(2)) {
        (Some(label), Some(token)) => match FIELDS.iter().find(|f| f.label() == label) {
            Some(field) => match field.expand(token) {
                Ok(value) => println!("{}", value.expanded()),
                Err(err) => println!("{}", err),
            },
            None => println!("Unknown field '{}'", label),
        },
        _ => println!(
            "Usage: cargo run --example expand-field -- \"[field label]\" \"[token]\""
        ),
    }
}
