use stagekit_communication::{list_ports, SUPPORTED_BAUD_RATES};

pub fn ports() -> anyhow::Result<()> {
    let ports = list_ports()?;
    if ports.is_empty() {
        println!("No serial ports found.");
    }
    for port in &ports {
        println!("{}", port);
    }

    let rates: Vec<String> = SUPPORTED_BAUD_RATES.iter().map(u32::to_string).collect();
    println!("Supported baud rates: {}", rates.join(", "));
    Ok(())
}
