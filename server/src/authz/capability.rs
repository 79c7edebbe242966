use novedades_misc::api::user::Role;

/// What a role is inherently allowed to do, independent of where its holder
/// sits in the reporting hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    /// Full administration: every user, every annotation, the audit log.
    pub manage_users: bool,

    /// May view and annotate subordinates at all.
    pub review_subordinates: bool,

    /// Roles this role may directly annotate. Hierarchy checks still apply
    /// on top of this list.
    pub annotate_targets: &'static [Role],
}

const NONE: Capability = Capability {
    manage_users: false,
    review_subordinates: false,
    annotate_targets: &[],
};

/// Looks up the capability set for a role name. Unrecognized names get the
/// empty set, never a default grant.
pub fn capability_for(role_name: &str) -> Capability {
    let role = match Role::from_name(role_name) {
        Some(role) => role,
        None => return NONE,
    };

    match role {
        Role::Admin => Capability {
            manage_users: true,
            review_subordinates: true,
            annotate_targets: &Role::ALL,
        },
        Role::JefaSalud => Capability {
            manage_users: false,
            review_subordinates: true,
            annotate_targets: &[Role::EncargadoRecinto, Role::EncargadoUnidad],
        },
        Role::EncargadoRecinto => Capability {
            manage_users: false,
            review_subordinates: true,
            annotate_targets: &[Role::EncargadoUnidad],
        },
        Role::EncargadoUnidad => Capability {
            manage_users: false,
            review_subordinates: true,
            annotate_targets: &[Role::Funcionario],
        },
        Role::Funcionario => NONE,
    }
}
