use ifrate_core::system_source;

/// Print every interface the platform counter source can enumerate.
pub fn run() -> ifrate_core::Result<()> {
    let source = system_source();
    let entries = source.interfaces()?;

    println!(
        "Found {} interface(s) via {} ({} counters):\n",
        entries.len(),
        source.name(),
        source.counter_width()
    );
    for entry in &entries {
        println!("  {:>4}  {}", entry.index, entry.name);
    }

    if entries.is_empty() {
        println!("  (none found)");
    }
    Ok(())
}
