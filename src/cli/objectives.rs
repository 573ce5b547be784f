use stagekit_settings::load_objectives;
use std::path::Path;

pub fn objectives(file: &Path) -> anyhow::Result<()> {
    let table = load_objectives(file)?;
    println!("{:>3}  {:<24} {:>10} {:>10}", "#", "label", "dx", "dy");
    for (index, entry) in table.iter().enumerate() {
        println!(
            "{:>3}  {:<24} {:>10.4} {:>10.4}",
            index, entry.label, entry.dx, entry.dy
        );
    }
    Ok(())
}
