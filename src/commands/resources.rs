//! Calendar resources (`resource`).

use anyhow::Result;

use crate::api::resources::ResourceFields;
use crate::args::Words;
use crate::command::Context;
use crate::error::GamError;

use super::unknown_argument;

fn parse_fields(words: &mut Words, command: &str, allow_name: bool) -> Result<ResourceFields, GamError> {
    let mut fields = ResourceFields::default();
    while let Some(keyword) = words.next_keyword() {
        match keyword.as_str() {
            "name" if allow_name => fields.common_name = Some(words.value_for("name")?),
            "description" => fields.description = Some(words.value_for("description")?),
            "type" => fields.kind = Some(words.value_for("type")?),
            other => return Err(unknown_argument(other, command)),
        }
    }
    Ok(fields)
}

/// `create resource <id> <common name> [description <d>] [type <t>]`
pub async fn create(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let id = words.require("a resource id")?;
    let common_name = words.require("a resource common name")?;
    let mut fields = parse_fields(words, "gam create resource", false)?;
    fields.common_name = Some(common_name);
    ctx.session.resources().create_resource(&id, &fields).await?;
    Ok(())
}

pub async fn update(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let id = words.require("a resource id")?;
    let fields = parse_fields(words, "gam update resource", true)?;
    ctx.session.resources().update_resource(&id, &fields).await?;
    Ok(())
}

pub async fn info(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let id = words.require("a resource id")?;
    let resource = ctx.session.resources().retrieve_resource(&id).await?;
    println!(" Resource ID: {}", resource.id);
    println!(" Common Name: {}", resource.common_name);
    println!(" Email: {}", resource.email);
    println!(" Type: {}", resource.kind);
    println!(" Description: {}", resource.description);
    Ok(())
}

pub async fn delete(ctx: &Context<'_>, words: &mut Words) -> Result<()> {
    let id = words.require("a resource id")?;
    ctx.session.resources().delete_resource(&id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_only_a_keyword_on_update() {
        let mut words = Words::new(["Name", "Room 1", "TYPE", "room"]);
        let fields = parse_fields(&mut words, "gam update resource", true).unwrap();
        assert_eq!(fields.common_name.as_deref(), Some("Room 1"));
        assert_eq!(fields.kind.as_deref(), Some("room"));

        let mut words = Words::new(["name", "Room 1"]);
        let err = parse_fields(&mut words, "gam create resource", false).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
