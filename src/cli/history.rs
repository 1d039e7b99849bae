use anyhow::Result;

use dns_manager::infrastructure::journal::Journal;

pub fn execute(lines: usize, clear: bool, host: Option<&str>) -> Result<()> {
    let journal = Journal::new()?;

    if clear {
        journal.clear()?;
        println!("History cleared.");
        return Ok(());
    }

    let content = journal.tail(lines, host)?;

    if content.is_empty() {
        match host {
            Some(host) => println!("No history found for {}.", host),
            None => println!("No history found."),
        }
        println!("History file: {}", journal.path().display());
        return Ok(());
    }

    println!("{}", content);
    Ok(())
}
