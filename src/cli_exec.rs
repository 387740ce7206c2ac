use anyhow::{Context, Result, anyhow};

use picksheet::export;
use picksheet::images::ImageResolver;
use picksheet::local::{LocalState, RemoteSettings};
use picksheet::model::{Status, now_ts};
use picksheet::remote::RemoteClient;
use picksheet::session::{ItemField, SelectionSession};
use picksheet::store::{HeaderFields, SelectionStore};

use crate::{DraftCommands, ExportCommands};

fn require_client(state: &LocalState) -> Result<RemoteClient> {
    let cfg = state.read_config()?;
    let remote = cfg
        .remote
        .ok_or_else(|| anyhow!("no remote configured (run `picksheet login`)"))?;
    let token = state
        .token(&remote.base_url)?
        .ok_or(picksheet::error::SelectionError::AuthRequired)?;
    RemoteClient::new(remote.base_url, token)
}

pub(super) fn handle_login(state: &LocalState, url: &str, token: &str) -> Result<()> {
    let client = RemoteClient::new(url, token)?;
    let me = client.whoami().context("verify credentials")?;

    let mut cfg = state.read_config()?;
    cfg.remote = Some(RemoteSettings {
        base_url: client.base_url().to_string(),
        token: None,
    });
    state.set_token(client.base_url(), token)?;
    state.write_config(&cfg)?;
    println!("Logged in as {}", me.handle);
    Ok(())
}

pub(super) fn handle_whoami(state: &LocalState, json: bool) -> Result<()> {
    let client = require_client(state)?;
    let me = client.whoami()?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "user_id": me.user_id,
                "handle": me.handle,
                "admin": me.admin,
            }))
            .context("serialize whoami json")?
        );
    } else if me.admin {
        println!("{} (admin)", me.handle);
    } else {
        println!("{}", me.handle);
    }
    Ok(())
}

pub(super) fn handle_draft(state: &LocalState, command: DraftCommands) -> Result<()> {
    let session = state.read_draft()?;
    match command {
        DraftCommands::Show { json } => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&session).context("serialize draft json")?
                );
            } else {
                print_draft(&session);
            }
        }
        DraftCommands::Profile { name, email } => {
            let mut next = session.clone();
            if let Some(name) = name {
                next.display_name = name;
            }
            if let Some(email) = email {
                next.contact_email = email;
            }
            state.write_draft(&next)?;
            println!("Draft profile updated");
        }
        DraftCommands::Set {
            category,
            item,
            field,
            value,
        } => {
            let field = ItemField::parse(&field)
                .ok_or_else(|| anyhow!("unknown field {field:?} (type, link or notes)"))?;
            let next = session.set_field(&category, item, field, &value);
            state.write_draft(&next)?;
        }
        DraftCommands::AddItem { category } => {
            let next = session.add_item(&category);
            state.write_draft(&next)?;
            println!("{}: {} items", category, next.items(&category).len());
        }
        DraftCommands::RemoveItem { category, item } => {
            let next = session.remove_item(&category, item);
            state.write_draft(&next)?;
        }
        DraftCommands::Attach {
            category,
            item,
            file,
        } => {
            let client = require_client(state)?;
            let me = client.whoami()?;
            let bytes =
                std::fs::read(&file).with_context(|| format!("read {}", file.display()))?;
            let filename = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("file")
                .to_string();

            let (uploading, preview) = session.attach_preview(&category, item, &filename);
            let resolver = ImageResolver::new(&client);
            match resolver.upload(&me.handle, &category, &filename, bytes) {
                Ok(url) => {
                    let done = uploading.complete_upload(&preview, &url);
                    state.write_draft(&done)?;
                    println!("Attached {}", url);
                }
                Err(err) => {
                    let done = uploading.fail_upload(&preview);
                    state.write_draft(&done)?;
                    return Err(err).context("upload attachment");
                }
            }
        }
    }
    Ok(())
}

/// Save path for `save` and `submit`. A submit is a save that also flips the
/// status and fires the notification; the notification never fails the save.
pub(super) fn handle_save(state: &LocalState, submit: bool) -> Result<()> {
    let client = require_client(state)?;
    let me = client.whoami()?;
    let session = state.read_draft()?;
    let categories = session.to_persistable().context("draft not persistable")?;

    let store = SelectionStore::new(&client);
    let fields = HeaderFields {
        display_name: session.display_name.clone(),
        contact_email: session.contact_email.clone(),
        status: Some(if submit {
            Status::Submitted
        } else {
            Status::Pending
        }),
    };
    store.save_all(&me.handle, &fields, &categories)?;
    println!("Saved selection for {}", me.handle);

    if submit {
        if let Err(err) = client.notify_submitted(&session.display_name, &session.contact_email) {
            eprintln!("[picksheet] submit notification failed: {err}");
        } else {
            println!("Submitted");
        }
    }
    Ok(())
}

pub(super) fn handle_list(state: &LocalState, exact: bool, json: bool) -> Result<()> {
    let client = require_client(state)?;
    let store = SelectionStore::new(&client);
    let headers = store.load_all(exact)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&headers).context("serialize headers json")?
        );
    } else {
        for h in headers {
            println!(
                "{} {} items={} {}",
                h.owner_id,
                h.status,
                h.total_count(),
                h.updated_at
            );
        }
    }
    Ok(())
}

pub(super) fn handle_show(state: &LocalState, owner: &str, json: bool) -> Result<()> {
    let client = require_client(state)?;
    let store = SelectionStore::new(&client);
    let header = store.load_header(owner)?;
    let categories = store.load_categories(owner)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "header": header,
                "categories": categories,
            }))
            .context("serialize selection json")?
        );
        return Ok(());
    }

    println!("owner: {}", header.owner_id);
    if !header.display_name.is_empty() {
        println!("name: {}", header.display_name);
    }
    if !header.contact_email.is_empty() {
        println!("email: {}", header.contact_email);
    }
    println!("status: {}", header.status);
    println!("updated_at: {}", header.updated_at);
    for doc in &categories {
        println!("{} ({} items)", doc.category_label, doc.items.len());
        for (i, item) in doc.items.iter().enumerate() {
            println!(
                "  {}. {} {} [{} images]",
                i + 1,
                item.type_or_model,
                item.link_or_sku,
                item.images.len()
            );
        }
    }
    Ok(())
}

pub(super) fn handle_status(state: &LocalState, owner: &str, value: &str) -> Result<()> {
    let client = require_client(state)?;
    let store = SelectionStore::new(&client);
    let status = Status::parse(value);
    store.set_status(owner, &status)?;
    println!("{} -> {}", owner, status);
    Ok(())
}

pub(super) fn handle_delete_item(
    state: &LocalState,
    owner: &str,
    category_id: &str,
    item: usize,
) -> Result<()> {
    let client = require_client(state)?;
    let store = SelectionStore::new(&client);
    store.delete_item(owner, category_id, item)?;
    println!("Deleted item {} from {}", item, category_id);
    Ok(())
}

pub(super) fn handle_delete_owner(state: &LocalState, owner: &str) -> Result<()> {
    let client = require_client(state)?;
    let store = SelectionStore::new(&client);
    store.delete_owner(owner)?;
    println!("Deleted {}", owner);
    Ok(())
}

pub(super) fn handle_export(state: &LocalState, command: ExportCommands) -> Result<()> {
    let client = require_client(state)?;
    let store = SelectionStore::new(&client);
    match command {
        ExportCommands::Csv { owner, out } => {
            let categories = store.load_categories(&owner)?;
            emit(out.as_deref(), &export::to_csv(&categories))
        }
        ExportCommands::Print { owner, out } => {
            let header = store.load_header(&owner)?;
            let categories = store.load_categories(&owner)?;
            emit(
                out.as_deref(),
                &export::to_print_html(&header, &categories, &now_ts()),
            )
        }
    }
}

fn emit(out: Option<&std::path::Path>, content: &str) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, content).with_context(|| format!("write {}", path.display()))?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        None => {
            print!("{content}");
            Ok(())
        }
    }
}

fn print_draft(session: &SelectionSession) {
    if !session.display_name.is_empty() {
        println!("name: {}", session.display_name);
    }
    if !session.contact_email.is_empty() {
        println!("email: {}", session.contact_email);
    }
    if session.pending_uploads() > 0 {
        println!("pending uploads: {}", session.pending_uploads());
    }
    if session.categories.is_empty() {
        println!("(empty draft)");
    }
    for (label, items) in &session.categories {
        println!("{} ({} items)", label, items.len());
        for (i, item) in items.iter().enumerate() {
            println!(
                "  {}. {} {} [{} images]",
                i + 1,
                item.type_or_model,
                item.link_or_sku,
                item.images.len()
            );
        }
    }
}
