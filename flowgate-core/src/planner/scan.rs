use crate::template::Reference;

use super::model::StepDef;

/// Every reference of a step in url, headers, body order.
pub(crate) fn scan_step(step: &StepDef) -> Vec<&Reference> {
    let mut out: Vec<&Reference> = step.url.references().collect();
    for tpl in step.headers.values() {
        out.extend(tpl.references());
    }
    if let Some(body) = &step.body {
        out.extend(body.references());
    }
    out
}
