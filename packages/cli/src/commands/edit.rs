use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use rcss_editor::{CommandSpec, Issued, PropertyTarget, PropertyValue, Session, ValueKind};
use std::path::{Path, PathBuf};

use super::fmt::overwrite;
use super::{resolve, ConsoleHost};
use crate::config::Config;

/// Edits are applied in a fixed order: create, modify, flip, set, image,
/// resolution, delete. Each flag may be repeated.
#[derive(Args, Debug, Default)]
pub struct EditArgs {
    /// Input .rcss file
    pub input: PathBuf,

    /// Spritesheet to edit (defaults to the first one)
    #[arg(short, long)]
    pub sheet: Option<String>,

    /// Spritesheet to edit by position, counting from 0
    #[arg(long, conflicts_with = "sheet")]
    pub sheet_index: Option<usize>,

    /// Create a sprite: name=x,y,w,h
    #[arg(long, value_name = "NAME=X,Y,W,H")]
    pub create: Vec<String>,

    /// Change a sprite's rectangle, optionally renaming it: name=x,y,w,h[:newname]
    #[arg(long, value_name = "NAME=X,Y,W,H[:NEW]")]
    pub modify: Vec<String>,

    /// Flip a sprite: name:x or name:y
    #[arg(long, value_name = "NAME:AXIS")]
    pub flip: Vec<String>,

    /// Set a property: spritesheet.prop=value or sprite.prop=value
    #[arg(long, value_name = "TARGET.PROP=VALUE")]
    pub set: Vec<String>,

    /// Point the spritesheet at another image
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// New resolution, or `none` to remove it
    #[arg(long)]
    pub resolution: Option<String>,

    /// Delete a sprite
    #[arg(long, value_name = "NAME")]
    pub delete: Vec<String>,

    /// Overwrite even if the file changed since it was read
    #[arg(long)]
    pub force: bool,
}

pub fn edit(args: EditArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let input = resolve(cwd, &args.input);
    let commands = collect_commands(&args)?;

    if commands.is_empty() {
        return Err(anyhow::anyhow!("No edits given"));
    }

    let mut session = Session::new(Box::new(ConsoleHost), config.editor);
    session.load_path(&input)?;
    if let Some(sheet) = &args.sheet {
        session.select_sheet(sheet)?;
    }
    if let Some(index) = args.sheet_index {
        session.select_sheet_index(index)?;
    }

    let mut applied = 0;
    for command in &commands {
        if let Issued::Applied(description) = session.issue(command)? {
            println!("{} {}", "✓".green(), description);
            applied += 1;
        }
    }

    if applied == 0 {
        println!("   Nothing changed, {} left untouched", input.display());
        return Ok(());
    }

    let report = session.save_in_place(&input, overwrite(args.force))?;
    println!();
    println!(
        "✨ {} {} edit(s) to {}",
        "Saved".green().bold(),
        applied,
        report.path.display()
    );

    Ok(())
}

fn collect_commands(args: &EditArgs) -> Result<Vec<CommandSpec>> {
    let mut commands = Vec::new();

    for spec in &args.create {
        let (name, [x, y, width, height]) = parse_rect(spec)?;
        commands.push(CommandSpec::CreateSprite {
            name,
            x,
            y,
            width,
            height,
        });
    }

    for spec in &args.modify {
        let (rect, rename) = match spec.rsplit_once(':') {
            Some((rect, rename)) => (rect, Some(rename.trim().to_string())),
            None => (spec.as_str(), None),
        };
        let (name, [x, y, width, height]) = parse_rect(rect)?;
        commands.push(CommandSpec::ModifySprite {
            name,
            x,
            y,
            width,
            height,
            rename,
        });
    }

    for spec in &args.flip {
        let (name, axis) = spec
            .split_once(':')
            .with_context(|| format!("Invalid flip '{}', expected name:axis", spec))?;
        commands.push(CommandSpec::FlipSprite {
            name: name.trim().to_string(),
            axis: axis.trim().to_string(),
        });
    }

    for spec in &args.set {
        let (key, value) = spec
            .split_once('=')
            .with_context(|| format!("Invalid set '{}', expected target.prop=value", spec))?;
        let (target, property) = key
            .split_once('.')
            .with_context(|| format!("Invalid set '{}', expected target.prop=value", spec))?;
        let target = match target.trim() {
            "spritesheet" => PropertyTarget::Spritesheet,
            sprite => PropertyTarget::Sprite(sprite.to_string()),
        };
        commands.push(CommandSpec::SetProperty {
            target,
            property: property.trim().to_string(),
            value: value.to_string(),
        });
    }

    if let Some(path) = &args.image {
        commands.push(CommandSpec::SetImage { path: path.clone() });
    }

    if let Some(resolution) = &args.resolution {
        let resolution = match PropertyValue::parse(ValueKind::OptionalNumber, resolution) {
            Ok(PropertyValue::OptionalNumber(resolution)) => resolution,
            Ok(_) => None,
            Err(reason) => return Err(anyhow::anyhow!("Invalid resolution: {}", reason)),
        };
        commands.push(CommandSpec::SetResolution { resolution });
    }

    for name in &args.delete {
        commands.push(CommandSpec::DeleteSprite {
            name: name.trim().to_string(),
        });
    }

    Ok(commands)
}

/// `name=x,y,w,h`, with an optional `px` on each number
fn parse_rect(spec: &str) -> Result<(String, [i32; 4])> {
    let (name, numbers) = spec
        .split_once('=')
        .with_context(|| format!("Invalid sprite '{}', expected name=x,y,w,h", spec))?;

    let values = numbers
        .split(',')
        .map(|n| n.trim().trim_end_matches("px").parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid sprite '{}', expected integers", spec))?;

    let rect: [i32; 4] = values
        .try_into()
        .map_err(|v: Vec<i32>| anyhow::anyhow!("Sprite {} has {} values, expected 4", name, v.len()))?;

    Ok((name.trim().to_string(), rect))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rect() {
        let (name, rect) = parse_rect("cursor=10,20px, 30,-40").unwrap();
        assert_eq!(name, "cursor");
        assert_eq!(rect, [10, 20, 30, -40]);

        assert!(parse_rect("cursor").is_err());
        assert!(parse_rect("cursor=1,2,3").is_err());
        assert!(parse_rect("cursor=a,b,c,d").is_err());
    }

    #[test]
    fn test_collect_commands_in_order() {
        let args = EditArgs {
            delete: vec!["old".to_string()],
            create: vec!["new=0,0,8,8".to_string()],
            modify: vec!["cursor=1,2,3,4:pointer".to_string()],
            flip: vec!["pointer:x".to_string()],
            set: vec!["spritesheet.src=other.png".to_string()],
            resolution: Some("none".to_string()),
            ..EditArgs::default()
        };

        let commands = collect_commands(&args).unwrap();
        assert_eq!(commands.len(), 6);
        assert!(matches!(&commands[0], CommandSpec::CreateSprite { name, .. } if name == "new"));
        assert_eq!(
            commands[1],
            CommandSpec::ModifySprite {
                name: "cursor".to_string(),
                x: 1,
                y: 2,
                width: 3,
                height: 4,
                rename: Some("pointer".to_string()),
            }
        );
        assert_eq!(
            commands[3],
            CommandSpec::SetProperty {
                target: PropertyTarget::Spritesheet,
                property: "src".to_string(),
                value: "other.png".to_string(),
            }
        );
        assert_eq!(commands[4], CommandSpec::SetResolution { resolution: None });
        assert!(matches!(&commands[5], CommandSpec::DeleteSprite { name } if name == "old"));
    }

    #[test]
    fn test_set_targets_sprite() {
        let args = EditArgs {
            set: vec!["cursor.width=12px".to_string()],
            resolution: Some("2x".to_string()),
            ..EditArgs::default()
        };

        let commands = collect_commands(&args).unwrap();
        assert_eq!(
            commands[0],
            CommandSpec::SetProperty {
                target: PropertyTarget::Sprite("cursor".to_string()),
                property: "width".to_string(),
                value: "12px".to_string(),
            }
        );
        assert_eq!(
            commands[1],
            CommandSpec::SetResolution {
                resolution: Some(2.0)
            }
        );
    }

    #[test]
    fn test_edit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hud.rcss");
        std::fs::write(&path, "body { }\n@spritesheet hud {\n  src: hud.png;\n}\n").unwrap();

        let args = EditArgs {
            input: path.clone(),
            create: vec!["cursor=0,0,8,8".to_string()],
            ..EditArgs::default()
        };
        edit(args, dir.path()).unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.starts_with("body { }\n@spritesheet hud\n"));
        assert!(saved.contains("\tcursor: 0px 0px 8px 8px;\n"));
    }

    #[test]
    fn test_edit_unnamed_sheet_by_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.rcss");
        std::fs::write(&path, "@spritesheet { src: a.png; }\n@spritesheet { src: b.png; }\n").unwrap();

        let args = EditArgs {
            input: path.clone(),
            sheet_index: Some(1),
            create: vec!["dot=0,0,2,2".to_string()],
            ..EditArgs::default()
        };
        edit(args, dir.path()).unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        let second = saved.split("src: b.png;").nth(1).unwrap();
        assert!(second.contains("\tdot: 0px 0px 2px 2px;\n"));
        assert!(!saved.split("src: b.png;").next().unwrap().contains("dot"));

        let args = EditArgs {
            input: path,
            sheet_index: Some(5),
            create: vec!["dot=0,0,2,2".to_string()],
            ..EditArgs::default()
        };
        assert!(edit(args, dir.path()).is_err());
    }
}
