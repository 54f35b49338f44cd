//! Enumerated status columns and their legal transitions.
//!
//! Every enum here maps one-to-one onto a `TEXT` column guarded by a `CHECK`
//! constraint in the schema, so `as_str` must stay in sync with the migrations.

use crate::CoreError;

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ::serde::Serialize,
            ::serde::Deserialize,
        )]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::CoreError::InvalidValue {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

pub(crate) use text_enum;

text_enum! {
    /// Role attached to a `users` row.
    UserRole {
        Influencer => "influencer",
        Admin => "admin",
        Marketing => "marketing",
    }
}

text_enum! {
    /// Tri-state gate shared by influencer accounts and video submissions.
    ApprovalStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

text_enum! {
    TaskStatus {
        Assigned => "assigned",
        InProgress => "in_progress",
        Submitted => "submitted",
        Completed => "completed",
        Rejected => "rejected",
    }
}

text_enum! {
    PaymentStatus {
        Pending => "pending",
        Paid => "paid",
        UnderReview => "under_review",
    }
}

text_enum! {
    PaymentType {
        Fixed => "fixed",
        RevenueShare => "revenue_share",
    }
}

text_enum! {
    RevenueShareStatus {
        Pending => "pending",
        Calculated => "calculated",
        Paid => "paid",
    }
}

text_enum! {
    IdProofType {
        Aadhaar => "aadhaar",
        Pan => "pan",
    }
}

text_enum! {
    FileType {
        Pdf => "pdf",
        Video => "video",
        Image => "image",
        Document => "document",
    }
}

text_enum! {
    ResourceCategory {
        General => "general",
        Training => "training",
        Guidelines => "guidelines",
        Examples => "examples",
    }
}

text_enum! {
    AccessLevel {
        All => "all",
        Influencer => "influencer",
        Admin => "admin",
    }
}

text_enum! {
    /// What happens to a task assignment when its linked submission is rejected.
    RejectionPolicy {
        /// The assignment is closed as `rejected`.
        Terminal => "terminal",
        /// The assignment returns to `in_progress` so a new video can be submitted.
        Resubmit => "resubmit",
    }
}

impl ApprovalStatus {
    /// Only `pending` records may be decided; decisions are final.
    #[must_use]
    pub fn can_transition_to(self, next: ApprovalStatus) -> bool {
        matches!(
            (self, next),
            (
                ApprovalStatus::Pending,
                ApprovalStatus::Approved | ApprovalStatus::Rejected
            )
        )
    }
}

impl TaskStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Rejected)
    }

    /// Forward moves plus rejection from any open state. `submitted → in_progress`
    /// is the resubmission path taken under [`RejectionPolicy::Resubmit`].
    #[must_use]
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::{Assigned, Completed, InProgress, Rejected, Submitted};

        match (self, next) {
            (Assigned, InProgress)
            | (Assigned | InProgress, Submitted)
            | (Submitted, Completed | InProgress) => true,
            (from, Rejected) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Statuses from which `next` is reachable in one step, as column values.
    #[must_use]
    pub fn predecessors(next: TaskStatus) -> Vec<&'static str> {
        TaskStatus::ALL
            .iter()
            .copied()
            .filter(|from| from.can_transition_to(next))
            .map(TaskStatus::as_str)
            .collect()
    }

    /// Assignment status that follows a review of its linked submission.
    #[must_use]
    pub fn after_review(decision: &ReviewDecision, policy: RejectionPolicy) -> TaskStatus {
        match (decision, policy) {
            (ReviewDecision::Approve, _) => TaskStatus::Completed,
            (ReviewDecision::Reject { .. }, RejectionPolicy::Terminal) => TaskStatus::Rejected,
            (ReviewDecision::Reject { .. }, RejectionPolicy::Resubmit) => TaskStatus::InProgress,
        }
    }
}

impl PaymentStatus {
    #[must_use]
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (
                PaymentStatus::Pending | PaymentStatus::UnderReview,
                PaymentStatus::Paid
            ) | (PaymentStatus::Pending, PaymentStatus::UnderReview)
                | (PaymentStatus::UnderReview, PaymentStatus::Pending)
        )
    }
}

impl AccessLevel {
    /// Access levels a caller with `role` may read.
    #[must_use]
    pub fn visible_to(role: UserRole) -> Vec<&'static str> {
        match role {
            UserRole::Admin => AccessLevel::ALL.iter().map(|l| l.as_str()).collect(),
            UserRole::Influencer => vec![AccessLevel::All.as_str(), AccessLevel::Influencer.as_str()],
            UserRole::Marketing => vec![AccessLevel::All.as_str()],
        }
    }
}

/// An admin's verdict on a pending video submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject { reason: String },
}

impl ReviewDecision {
    /// Build a decision from its wire parts (`"approve"` / `"reject"` plus an
    /// optional reason).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] when a rejection carries no reason, and
    /// [`CoreError::InvalidValue`] for an unknown decision.
    pub fn from_parts(decision: &str, reason: Option<&str>) -> Result<Self, CoreError> {
        match decision {
            "approve" => Ok(ReviewDecision::Approve),
            "reject" => {
                let reason = reason.map(str::trim).unwrap_or_default();
                if reason.is_empty() {
                    return Err(CoreError::Validation(
                        "a rejection reason is required".to_string(),
                    ));
                }
                Ok(ReviewDecision::Reject {
                    reason: reason.to_string(),
                })
            }
            other => Err(CoreError::InvalidValue {
                kind: "ReviewDecision",
                value: other.to_string(),
            }),
        }
    }

    #[must_use]
    pub fn approval_status(&self) -> ApprovalStatus {
        match self {
            ReviewDecision::Approve => ApprovalStatus::Approved,
            ReviewDecision::Reject { .. } => ApprovalStatus::Rejected,
        }
    }

    #[must_use]
    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            ReviewDecision::Approve => None,
            ReviewDecision::Reject { reason } => Some(reason),
        }
    }
}
