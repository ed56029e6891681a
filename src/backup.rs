use anyhow::{anyhow, Context};
use serde_json::json;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::model::{Achievement, Participation, Student};
use crate::store::{SLOT_ACHIEVEMENTS, SLOT_PARTICIPATIONS, SLOT_STUDENTS};

const MANIFEST_ENTRY: &str = "manifest.json";
const META_WORKSPACE_ENTRY: &str = "meta/workspace.json";
pub const BUNDLE_FORMAT_V1: &str = "achievement-portal-workspace-v1";

const SLOTS: [&str; 3] = [SLOT_STUDENTS, SLOT_ACHIEVEMENTS, SLOT_PARTICIPATIONS];

fn data_entry(slot: &str) -> String {
    format!("data/{}", slot)
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
}

pub fn export_workspace_bundle(
    workspace_path: &Path,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    for slot in SLOTS {
        if !workspace_path.join(slot).is_file() {
            return Err(anyhow!(
                "workspace slot not found: {}",
                workspace_path.join(slot).to_string_lossy()
            ));
        }
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let exported_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": exported_at,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    for slot in SLOTS {
        zip.start_file(data_entry(slot), opts)
            .with_context(|| format!("failed to start entry for {}", slot))?;
        let mut slot_file = File::open(workspace_path.join(slot))
            .with_context(|| format!("failed to open slot {}", slot))?;
        std::io::copy(&mut slot_file, &mut zip)
            .with_context(|| format!("failed to write entry for {}", slot))?;
    }

    let workspace_meta = json!({
        "sourceWorkspace": workspace_path.to_string_lossy(),
    });
    zip.start_file(META_WORKSPACE_ENTRY, opts)
        .context("failed to start workspace metadata entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&workspace_meta)
            .context("failed to serialize workspace metadata")?
            .as_bytes(),
    )
    .context("failed to write workspace metadata entry")?;

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: SLOTS.len() + 2,
    })
}

pub fn import_workspace_bundle(
    in_path: &Path,
    workspace_path: &Path,
) -> anyhow::Result<ImportSummary> {
    std::fs::create_dir_all(workspace_path).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace_path.to_string_lossy()
        )
    })?;

    if !is_zip_file(in_path)? {
        return Err(anyhow!(
            "not a workspace bundle: {}",
            in_path.to_string_lossy()
        ));
    }

    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }

    // Read and type-check every slot before touching the workspace, so a
    // malformed bundle aborts with nothing written.
    let mut bodies: Vec<(&str, String)> = Vec::with_capacity(SLOTS.len());
    for slot in SLOTS {
        let mut text = String::new();
        archive
            .by_name(&data_entry(slot))
            .with_context(|| format!("bundle missing data/{}", slot))?
            .read_to_string(&mut text)
            .with_context(|| format!("failed to read data/{}", slot))?;
        validate_slot_body(slot, &text)?;
        bodies.push((slot, text));
    }

    for (slot, text) in bodies {
        let tmp = workspace_path.join(format!("{}.importing", slot));
        std::fs::write(&tmp, text.as_bytes())
            .with_context(|| format!("failed to stage {}", slot))?;
        std::fs::rename(&tmp, workspace_path.join(slot))
            .with_context(|| format!("failed to move {} into place", slot))?;
    }

    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
    })
}

fn validate_slot_body(slot: &str, text: &str) -> anyhow::Result<()> {
    let res = match slot {
        SLOT_STUDENTS => serde_json::from_str::<Vec<Student>>(text).map(|_| ()),
        SLOT_ACHIEVEMENTS => serde_json::from_str::<Vec<Achievement>>(text).map(|_| ()),
        SLOT_PARTICIPATIONS => serde_json::from_str::<Vec<Participation>>(text).map(|_| ()),
        other => return Err(anyhow!("unexpected slot {}", other)),
    };
    res.with_context(|| format!("bundle entry data/{} does not parse", slot))
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}
