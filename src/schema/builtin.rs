//! Built-in vendor schemas

use super::{BlockStyle, VendorSchema};

/// All schemas shipped with netlint
pub fn builtin_schemas() -> Vec<VendorSchema> {
    vec![
        cisco_ios(),
        cisco_nxos(),
        cisco_iosxr(),
        arista_eos(),
        aruba_aoscx(),
        huawei_vrp(),
        cumulus_linux(),
        cumulus_nclu(),
        juniper_junos(),
        juniper_set(),
        nokia_sros(),
        vyos(),
        fortinet_fortios(),
    ]
}

fn cisco_ios() -> VendorSchema {
    VendorSchema::new("cisco-ios", "cisco", BlockStyle::Indent)
        .with_description("Cisco IOS / IOS-XE running-config")
        .with_aliases(&["ios", "cisco", "ios-xe", "cisco-iosxe"])
        .with_comments(&["!"])
        .with_terminators(&[
            "exit",
            "exit-address-family",
            "exit-peer-policy",
            "exit-peer-session",
            "exit-vrf",
            "end",
        ])
        .with_delimited(&["banner"])
}

fn cisco_nxos() -> VendorSchema {
    VendorSchema::new("cisco-nxos", "cisco", BlockStyle::Indent)
        .with_description("Cisco NX-OS running-config")
        .with_aliases(&["nxos", "nx-os"])
        .with_comments(&["!"])
        .with_terminators(&["exit"])
        .with_delimited(&["banner"])
}

fn cisco_iosxr() -> VendorSchema {
    VendorSchema::new("cisco-iosxr", "cisco", BlockStyle::Indent)
        .with_description("Cisco IOS-XR running-config")
        .with_aliases(&["iosxr", "ios-xr"])
        .with_comments(&["!"])
        .with_terminators(&["exit", "root", "end-policy", "end-set", "end-group", "end"])
        .with_delimited(&["banner"])
}

fn arista_eos() -> VendorSchema {
    VendorSchema::new("arista-eos", "arista", BlockStyle::Indent)
        .with_description("Arista EOS running-config")
        .with_aliases(&["eos", "arista"])
        .with_comments(&["!"])
        .with_terminators(&["exit", "end"])
}

fn aruba_aoscx() -> VendorSchema {
    VendorSchema::new("aruba-aoscx", "aruba", BlockStyle::Indent)
        .with_description("Aruba AOS-CX running-config")
        .with_aliases(&["aoscx", "aruba", "aos-cx"])
        .with_comments(&["!"])
        .with_terminators(&["exit"])
}

fn huawei_vrp() -> VendorSchema {
    VendorSchema::new("huawei-vrp", "huawei", BlockStyle::Indent)
        .with_description("Huawei VRP current-configuration")
        .with_aliases(&["vrp", "huawei"])
        .with_comments(&["#", "!"])
        .with_terminators(&["quit", "return"])
}

fn cumulus_linux() -> VendorSchema {
    VendorSchema::new("cumulus-linux", "cumulus", BlockStyle::Indent)
        .with_description("Cumulus Linux ifupdown2 interfaces file")
        .with_aliases(&["cumulus", "ifupdown2"])
        .with_comments(&["#"])
        .with_continuation("\\")
        .case_sensitive()
}

fn cumulus_nclu() -> VendorSchema {
    VendorSchema::new("cumulus-nclu", "cumulus", BlockStyle::Flat)
        .with_description("Cumulus NCLU `net add` command list")
        .with_aliases(&["nclu"])
        .with_comments(&["#"])
        .case_sensitive()
}

fn juniper_junos() -> VendorSchema {
    VendorSchema::new("juniper-junos", "juniper", BlockStyle::Brace)
        .with_description("Juniper Junos hierarchical configuration")
        .with_aliases(&["junos", "juniper"])
        .with_comments(&["#"])
        .with_block_comment("/*", "*/")
        .case_sensitive()
}

fn juniper_set() -> VendorSchema {
    VendorSchema::new("juniper-set", "juniper", BlockStyle::Flat)
        .with_description("Juniper Junos `display set` output")
        .with_aliases(&["junos-set"])
        .with_comments(&["#"])
        .case_sensitive()
}

fn nokia_sros() -> VendorSchema {
    VendorSchema::new("nokia-sros", "nokia", BlockStyle::Brace)
        .with_description("Nokia SR OS MD-CLI configuration")
        .with_aliases(&["sros", "nokia", "timos"])
        .with_comments(&["#"])
        .with_block_comment("/*", "*/")
        .case_sensitive()
}

fn vyos() -> VendorSchema {
    VendorSchema::new("vyos", "vyos", BlockStyle::Brace)
        .with_description("VyOS / EdgeOS config.boot")
        .with_aliases(&["edgeos"])
        .with_comments(&["#"])
        .with_block_comment("/*", "*/")
        .case_sensitive()
}

fn fortinet_fortios() -> VendorSchema {
    VendorSchema::new("fortinet-fortios", "fortinet", BlockStyle::Keyword)
        .with_description("Fortinet FortiOS full-configuration")
        .with_aliases(&["fortios", "fortigate", "fortinet"])
        .with_comments(&["#"])
        .with_keyword_block("config", "end")
        .with_keyword_block("edit", "next")
}
