use crate::scenarios::{self, Suite};

/// `storecheck list`: print scenario ids grouped by suite.
pub fn list(filter: Option<&str>) {
    let mut current: Option<Suite> = None;
    let mut shown = 0usize;

    for scenario in scenarios::registry() {
        if filter.is_some_and(|p| !scenario.matches_filter(p)) {
            continue;
        }
        if current != Some(scenario.suite) {
            if current.is_some() {
                println!();
            }
            println!("\x1b[1m{}\x1b[0m", scenario.suite);
            current = Some(scenario.suite);
        }
        println!("  {}  \x1b[2m{}\x1b[0m", scenario.id(), scenario.title);
        shown += 1;
    }

    if shown == 0 {
        println!("No scenarios match filter");
    } else {
        println!();
        println!("{shown} scenario(s)");
    }
}
