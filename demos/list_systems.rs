use std::time::Duration;

use redfish::Client;
use redfish::schemas::ComputerSystem;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example:
    //   cargo run --example list_systems -- https://192.168.1.10 admin password
    let mut args = std::env::args().skip(1);
    let endpoint = args.next().ok_or("missing <endpoint>")?;
    let username = args.next().ok_or("missing <username>")?;
    let password = args.next().ok_or("missing <password>")?;

    let client = Client::builder(endpoint)
        .username(username)
        .password(password)
        .insecure(true)
        .timeout(Duration::from_secs(5))
        .connect()?;

    let root = client.service_root()?;
    let systems = root.systems::<ComputerSystem>()?;
    for system in &systems.items {
        println!(
            "{} {} {} power={} health={:?}",
            system.entity.id,
            system.manufacturer,
            system.model,
            system.power_state,
            system.status.health
        );
    }
    if !systems.is_complete() {
        eprintln!("{}", systems.failures);
    }

    client.logout()?;
    Ok(())
}
