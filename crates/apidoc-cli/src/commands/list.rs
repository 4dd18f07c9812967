use anyhow::{Result, bail};
use apidoc::ApidocConfig;
use std::io::Write;

/// Print the entries of the container at `path`, one `name<TAB>kind` per
/// line.
pub fn run(config: &ApidocConfig, path: &str, out: &mut impl Write) -> Result<()> {
    let apidoc = config.build()?;
    let Some(located) = apidoc.traverse(path) else {
        bail!("Nothing is documented at `{path}`");
    };
    for (name, child) in located.items() {
        // We're printing to stdout, so we don't need to use tracing
        writeln!(out, "{name}\t{}", child.node().kind())?;
    }
    Ok(())
}
