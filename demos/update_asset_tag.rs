use redfish::schemas::ComputerSystem;
use redfish::{Client, Resource, get_object};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example:
    //   cargo run --example update_asset_tag -- https://192.168.1.10 admin password /redfish/v1/Systems/1 rack-42
    let mut args = std::env::args().skip(1);
    let endpoint = args.next().ok_or("missing <endpoint>")?;
    let username = args.next().ok_or("missing <username>")?;
    let password = args.next().ok_or("missing <password>")?;
    let uri = args.next().ok_or("missing <system uri>")?;
    let asset_tag = args.next().ok_or("missing <asset tag>")?;

    let client = Client::builder(endpoint)
        .username(username)
        .password(password)
        .insecure(true)
        .connect()?;

    let mut system: ComputerSystem = get_object(&client, &uri, &[])?;
    system.asset_tag = asset_tag;
    system.update(ComputerSystem::WRITABLE)?;
    println!("updated {}", system.entity.odata_id);

    client.logout()?;
    Ok(())
}
