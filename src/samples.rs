//! Built-in sample documents.
//!
//! Short but realistic texts for demos (`clausewise analyze --sample lease`)
//! and as test fixtures. Each is well above the minimum text length.

use std::fmt;
use std::str::FromStr;

/// Which sample to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    Lease,
    Nda,
    Contract,
}

impl SampleKind {
    pub const ALL: [SampleKind; 3] = [SampleKind::Lease, SampleKind::Nda, SampleKind::Contract];

    pub fn text(self) -> &'static str {
        match self {
            SampleKind::Lease => LEASE,
            SampleKind::Nda => NDA,
            SampleKind::Contract => SERVICE_AGREEMENT,
        }
    }

    /// Value passed as `documentType` alongside the sample.
    pub fn document_type(self) -> &'static str {
        match self {
            SampleKind::Lease => "lease",
            SampleKind::Nda => "nda",
            SampleKind::Contract => "contract",
        }
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.document_type())
    }
}

impl FromStr for SampleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lease" => Ok(SampleKind::Lease),
            "nda" => Ok(SampleKind::Nda),
            "contract" | "service" => Ok(SampleKind::Contract),
            other => Err(format!("unknown sample '{other}' (expected lease, nda or contract)")),
        }
    }
}

pub const LEASE: &str = r#"RESIDENTIAL LEASE AGREEMENT

This lease agreement is entered into on January 1, 2024, between ABC Property Management (Landlord) and John Smith (Tenant) for the property located at 123 Main Street, Anytown, ST 12345.

TERM: This lease shall commence on January 1, 2024, and terminate on December 31, 2024, unless renewed or extended.

RENT: Tenant agrees to pay monthly rent of $2,500.00, due on the 1st day of each month. Late fees of $100.00 will be charged for payments received after the 5th day of the month.

SECURITY DEPOSIT: Tenant shall pay a security deposit of $2,500.00 prior to occupancy.

UTILITIES: Tenant is responsible for electricity, gas, internet, and cable. Landlord pays for water, sewer, and trash collection.

PETS: No pets are allowed without prior written consent from Landlord. If approved, a pet deposit of $500.00 is required.

MAINTENANCE: Tenant shall maintain the premises in good condition. Tenant is responsible for repairs under $100.00. Landlord is responsible for major repairs and maintenance.

RENT INCREASES: Landlord reserves the right to increase rent by up to 10% upon lease renewal or extension.

TERMINATION: Either party may terminate this lease with 30 days written notice. Early termination by tenant may result in forfeiture of security deposit.

INSPECTION: Landlord may inspect the premises with 24 hours written notice to tenant.

This agreement constitutes the entire agreement between the parties and may only be modified in writing signed by both parties."#;

pub const NDA: &str = r#"NON-DISCLOSURE AGREEMENT

This Non-Disclosure Agreement ("Agreement") is entered into on [DATE] between TechCorp Inc., a Delaware corporation ("Disclosing Party") and [RECIPIENT NAME] ("Receiving Party").

PURPOSE: The parties wish to explore a potential business relationship and need to share confidential information.

CONFIDENTIAL INFORMATION: Any information disclosed by either party, whether oral, written, or electronic, including but not limited to business plans, financial information, customer lists, technical data, and trade secrets.

OBLIGATIONS: Receiving Party agrees to:
1. Keep all confidential information strictly confidential
2. Not disclose confidential information to third parties
3. Use confidential information solely for evaluation purposes
4. Return or destroy all confidential information upon request

TERM: This agreement shall remain in effect for 2 years from the date of signing.

EXCEPTIONS: This agreement does not apply to information that:
- Is publicly available
- Was known prior to disclosure
- Is independently developed
- Is required to be disclosed by law

REMEDIES: Breach of this agreement may result in irreparable harm, and the disclosing party may seek injunctive relief and monetary damages.

GOVERNING LAW: This agreement shall be governed by the laws of Delaware."#;

pub const SERVICE_AGREEMENT: &str = r#"SERVICE AGREEMENT

This Service Agreement is entered into on [DATE] between Digital Solutions LLC ("Provider") and [CLIENT NAME] ("Client").

SERVICES: Provider agrees to provide web development and digital marketing services as detailed in Exhibit A.

TERM: This agreement begins on [START DATE] and continues for 12 months, with automatic renewal unless terminated.

COMPENSATION: Client agrees to pay $5,000 per month, due on the 1st of each month. Late payments incur a 5% monthly penalty.

INTELLECTUAL PROPERTY: All work product created by Provider shall be owned by Client upon full payment. Provider retains rights to general methodologies and know-how.

CONFIDENTIALITY: Both parties agree to maintain confidentiality of proprietary information shared during this engagement.

TERMINATION: Either party may terminate with 30 days written notice. Client remains liable for all work completed through termination date.

LIABILITY: Provider's liability is limited to the amount paid by Client in the 12 months preceding any claim.

INDEMNIFICATION: Client agrees to indemnify Provider against claims arising from Client's use of the services.

GOVERNING LAW: This agreement is governed by the laws of [STATE]."#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use crate::document::normalize_text;

    #[test]
    fn samples_pass_the_normalizer() {
        let config = AnalyzerConfig::default();
        for kind in SampleKind::ALL {
            assert_eq!(normalize_text(kind.text(), &config).unwrap(), kind.text());
        }
    }

    #[test]
    fn parse_round_trips_display() {
        for kind in SampleKind::ALL {
            assert_eq!(kind.to_string().parse::<SampleKind>().unwrap(), kind);
        }
        assert!("will".parse::<SampleKind>().is_err());
    }
}
