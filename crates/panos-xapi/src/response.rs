//! Parsing of XML API response envelopes.
//!
//! Every reply from the device is a `<response status="...">` envelope.
//! Failures carry an optional numeric `code` attribute and a `<msg>` node
//! whose text (sometimes split across `<line>` children) is the only
//! diagnostic the device provides.

use panos_core::{PanDeviceError, Result};
use roxmltree::{Document, Node};

/// Status of an asynchronous device job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    /// Whether the job has reached its final state (`FIN`).
    pub finished: bool,
    /// The job result, once reported (`OK`, `FAIL`).
    pub result: Option<String>,
    /// Progress indicator as reported by the device (a percentage).
    pub progress: Option<String>,
}

fn parse_document(body: &str) -> Result<Document<'_>> {
    Document::parse(body)
        .map_err(|err| PanDeviceError::new(format!("unparseable device response: {err}")))
}

fn response_root<'a, 'i>(doc: &'a Document<'i>) -> Result<Node<'a, 'i>> {
    let root = doc.root_element();
    if root.has_tag_name("response") {
        Ok(root)
    } else {
        Err(PanDeviceError::new(format!(
            "unexpected device response element `{}`",
            root.tag_name().name()
        )))
    }
}

fn message_text(root: Node<'_, '_>) -> String {
    root.descendants()
        .find(|node| node.has_tag_name("msg"))
        .map(|msg| {
            msg.descendants()
                .filter(roxmltree::Node::is_text)
                .filter_map(|node| node.text())
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

fn ensure_status(root: Node<'_, '_>) -> Result<()> {
    match root.attribute("status") {
        Some("success") => Ok(()),
        _ => Err(PanDeviceError::from_device(
            root.attribute("code"),
            &message_text(root),
        )),
    }
}

/// Check a response envelope, turning an error status into [`PanDeviceError`].
///
/// # Errors
///
/// Returns an error when the body is not a response envelope or the device
/// reported anything other than success.
pub fn ensure_success(body: &str) -> Result<()> {
    let doc = parse_document(body)?;
    ensure_status(response_root(&doc)?)
}

/// Extract the API key from a keygen response.
///
/// # Errors
///
/// Returns an error when the device rejected the credentials or the reply
/// carries no key.
pub fn parse_key(body: &str) -> Result<String> {
    let doc = parse_document(body)?;
    let root = response_root(&doc)?;
    ensure_status(root)?;

    root.descendants()
        .find(|node| node.has_tag_name("key"))
        .and_then(|node| node.text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| PanDeviceError::new("keygen response did not contain an API key"))
}

/// Extract the job id from a commit response.
///
/// A successful commit reply without a job id means the candidate
/// configuration was empty and there is nothing to wait for.
///
/// # Errors
///
/// Returns an error when the device rejected the commit.
pub fn parse_job_id(body: &str) -> Result<Option<u64>> {
    let doc = parse_document(body)?;
    let root = response_root(&doc)?;
    ensure_status(root)?;

    Ok(root
        .descendants()
        .find(|node| node.has_tag_name("job"))
        .and_then(|node| node.text())
        .and_then(|text| text.trim().parse().ok()))
}

/// Parse a `show jobs id` reply into a [`JobStatus`].
///
/// # Errors
///
/// Returns an error when the reply is not a successful envelope or carries
/// no job element.
pub fn parse_job_status(body: &str) -> Result<JobStatus> {
    let doc = parse_document(body)?;
    let root = response_root(&doc)?;
    ensure_status(root)?;

    let job = root
        .descendants()
        .find(|node| node.has_tag_name("job"))
        .ok_or_else(|| PanDeviceError::new("job status response did not contain a job"))?;

    let child_text = |name: &str| {
        job.children()
            .find(|node| node.has_tag_name(name))
            .and_then(|node| node.text())
            .map(|text| text.trim().to_string())
    };

    Ok(JobStatus {
        finished: child_text("status").as_deref() == Some("FIN"),
        result: child_text("result"),
        progress: child_text("progress"),
    })
}
