use anyhow::Result;
use nxchat_core::identity::IdentityStore;
use nxchat_infrastructure::NxChatPaths;

pub async fn run(paths: &NxChatPaths) -> Result<()> {
    let (config, storage) = super::open(paths)?;
    let visitor_id = IdentityStore::new(storage)
        .get_or_create_visitor_id(&config.tenant_id)
        .await;

    println!("tenant:  {}", config.tenant_id);
    println!("visitor: {}", visitor_id);
    Ok(())
}
