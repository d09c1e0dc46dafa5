//! Request payloads for the walk-through. Values are passed to the appliance
//! as-is; see the appliance documentation for their meaning.

/// Parameter file uploaded from the data directory, then deleted again.
pub const PARAM_FILE: &str = "fio-1vmdk-100ws-4-100rdpct-100randompct-2threads";

/// Workload parameters for `generateParam`.
pub const WORKLOAD: &[(&str, &str)] = &[
    // Disks under test, at most `diskNum` of the configuration
    ("diskNum", "8"),
    // Working set, percent
    ("workSet", "100"),
    // Threads per disk
    ("threadNum", "4"),
    ("blockSize", "4k"),
    ("readPercent", "70"),
    ("randomPercent", "100"),
    // IO rate limit per VM (optional)
    ("ioRate", ""),
    // Seconds
    ("testTime", "600"),
    ("warmupTime", "120"),
    ("intervalTime", ""),
    ("tool", "fio"),
];

/// Test configuration for `generatefile` (`perf-conf.yaml` on the appliance).
pub const CONFIGURATION: &[(&str, &str)] = &[
    ("tool", "fio"),
    ("vcenterIp", "vcenter.lab.local"),
    ("vcenterName", "administrator@vsphere.local"),
    ("vcenterPwd", "changeme"),
    ("dcenterName", "lab-dc"),
    ("clusterName", "lab-cluster"),
    // Resource pool, VM folder (optional)
    ("rpName", ""),
    ("fdName", ""),
    // Defaults to "VM Network" when empty
    ("networkName", "vm network"),
    // Set when the network has no DHCP; 172.17 is taken by the appliance's Docker network
    ("staticEnabled", "false"),
    ("staticIpprefix", "172.28"),
    // Several datastores are newline separated
    ("dstoreName", "vsanDatastore"),
    ("storagePolicy", ""),
    ("deployHost", "false"),
    ("hosts", ""),
    // vSAN only; needs hostName/hostPwd
    ("clearCache", "false"),
    ("hostName", "root"),
    ("hostPwd", "changeme"),
    ("reuseVM", "true"),
    // vSAN only; picks from 4k70r, 4k100r, 8k50r, 256k0r
    ("easyRun", "false"),
    ("workloads", ""),
    // Ignored when easyRun is true. VM prefix is at most 7 characters
    ("vmPrefix", "hci-fio"),
    ("vmNum", "20"),
    ("diskNum", "8"),
    ("diskSize", "20"),
    ("filePath", "/opt/automation/fio-param-files"),
    ("outPath", "DemoTest"),
    // NONE, ZERO or RANDOM
    ("warmUp", "RANDOM"),
    ("duration", "3600"),
    ("cleanUp", "false"),
    // Empty means every parameter file of the tool
    ("selectVdbench", "fio-1vmdk-100ws-4-100rdpct-100randompct-2threads"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workload_names_a_param_file() {
        assert_eq!(
            hcibench_core::param_file_name(WORKLOAD).unwrap(),
            "fio-8vmdk-100ws-4k-70rdpct-100randompct-4threads"
        );
    }

    #[test]
    fn configuration_selects_the_uploaded_file() {
        let selected = CONFIGURATION
            .iter()
            .find(|(k, _)| *k == "selectVdbench")
            .map(|(_, v)| *v);
        assert_eq!(selected, Some(PARAM_FILE));
    }
}
