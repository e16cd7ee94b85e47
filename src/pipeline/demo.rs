//! Canned results served when a session runs in demo mode.
//!
//! They pass through the same sanitiser, filters and exporters as live
//! results, so the rest of the crate cannot tell the two apart.

use crate::config::{ResultKind, ToolKind};

/// Party name pre-filled by the legal risk demo.
pub const DEMO_PARTY: &str = "Tenant";

pub const LEGAL_PLAIN: &str = r#"<h2>Residential Lease Agreement: Plain-English Summary</h2>
<p>This agreement lets the <strong>Tenant</strong> rent the apartment at 14 Harbour Street for <strong>12 months</strong>, starting 1 March.</p>
<h3>Key points</h3>
<ul>
  <li>Monthly rent is <strong>$1,850</strong>, due on the 1st of each month.</li>
  <li>A security deposit of <strong>$3,700</strong> is held for the length of the lease.</li>
  <li>Either party may end the lease early with <em>60 days' written notice</em>.</li>
  <li>The Landlord handles structural repairs; the Tenant handles minor upkeep.</li>
</ul>
<h3>What you should check</h3>
<ol>
  <li>Late payments attract a fee of 5% after a 5-day grace period.</li>
  <li>Subletting requires the Landlord's written consent.</li>
</ol>
<p>Overall the lease follows standard residential terms with no unusual obligations.</p>"#;

pub const LEGAL_RISK: &str = r#"<h2>Risk Analysis for the Tenant</h2>
<p>The clauses below were reviewed from the Tenant's point of view.</p>
<table>
  <thead>
    <tr><th>Clause</th><th>Summary</th><th>Risk</th></tr>
  </thead>
  <tbody>
    <tr><td>4.2 Rent review</td><td>Rent may rise once a year by up to 3%.</td><td>Low</td></tr>
    <tr><td>7.1 Repairs</td><td>Tenant pays for repairs caused by "ordinary use".</td><td>Medium</td></tr>
    <tr><td>9.3 Early termination</td><td>Tenant forfeits the full deposit when leaving early.</td><td>High</td></tr>
    <tr><td>11 Insurance</td><td>Tenant must hold contents insurance.</td><td>Low</td></tr>
  </tbody>
</table>
<h3>Recommendations</h3>
<ul>
  <li>Ask for clause 9.3 to cap forfeiture at one month's rent.</li>
  <li>Clarify which repairs count as <em>ordinary use</em> in clause 7.1.</li>
</ul>"#;

pub const MEDICAL: &str = r#"<h2>Blood Test Results Explained</h2>
<p>Your report from <strong>12 January</strong> covers a full blood count and a metabolic panel.</p>
<h3>Results in the normal range</h3>
<ul>
  <li><strong>Haemoglobin</strong> 14.1 g/dL: healthy oxygen-carrying capacity.</li>
  <li><strong>White cells</strong> 6.2 ×10⁹/L: no sign of infection.</li>
  <li><strong>Kidney function</strong> (eGFR 92): kidneys are filtering well.</li>
</ul>
<h3>Worth discussing with your doctor</h3>
<ul>
  <li><strong>LDL cholesterol</strong> 3.6 mmol/L is slightly above target.</li>
  <li><strong>Vitamin D</strong> 38 nmol/L is on the low side.</li>
</ul>
<p><em>This summary is for information only and does not replace medical advice.</em></p>"#;

pub const TRANSLATION: &str = r#"<h1>Translation of PDF</h1>
<h2>Certificate of Employment</h2>
<p>We hereby confirm that <strong>Ms. Ana Ribeiro</strong> has been employed by our company since 3 May 2019 as a <em>Senior Accountant</em>.</p>
<p>Her duties include preparing monthly financial statements, coordinating external audits and supervising a team of four.</p>
<p>This certificate is issued at the employee's request for whatever purpose she deems appropriate.</p>
<p>Lisbon, 14 February 2024</p>"#;

pub const MEDICAL_REPORT: &str = r#"<h2>Radiology Report Summary</h2>
<p><strong>Examination:</strong> MRI of the left knee.</p>
<h3>Findings</h3>
<ul>
  <li>Small tear in the posterior horn of the medial meniscus.</li>
  <li>Mild fluid in the joint (effusion).</li>
  <li>Ligaments are intact.</li>
</ul>
<h3>What this means</h3>
<p>A meniscus tear of this size is common and is often treated with physiotherapy before surgery is considered.</p>"#;

pub const ORTHODONTIC: &str = r#"<h2>Cephalometric Analysis</h2>
<table>
  <thead>
    <tr><th>Measurement</th><th>Value</th><th>Norm</th></tr>
  </thead>
  <tbody>
    <tr><td>SNA</td><td>84°</td><td>82° ± 2</td></tr>
    <tr><td>SNB</td><td>78°</td><td>80° ± 2</td></tr>
    <tr><td>ANB</td><td>6°</td><td>2° ± 2</td></tr>
  </tbody>
</table>
<h3>Interpretation</h3>
<ul>
  <li>Skeletal <strong>Class II</strong> pattern driven by mandibular retrusion.</li>
  <li>Lower incisors proclined relative to the mandibular plane.</li>
</ul>
<p>Consider functional appliance therapy while growth remains.</p>"#;

/// Canned HTML for `tool`, or for the legal risk pass when `kind` is
/// [`ResultKind::Risk`].
pub fn content(tool: ToolKind, kind: ResultKind) -> &'static str {
    match (tool, kind) {
        (ToolKind::Legal, ResultKind::Risk) => LEGAL_RISK,
        (ToolKind::Legal, _) => LEGAL_PLAIN,
        (ToolKind::Medical, _) => MEDICAL,
        (ToolKind::Translation, _) => TRANSLATION,
        (ToolKind::MedicalReport, _) => MEDICAL_REPORT,
        (ToolKind::Orthodontic, _) => ORTHODONTIC,
    }
}
