use crate::finding::Finding;

/// Instructions handed to the assistant for one finding.
pub fn fix_prompt(finding: &Finding) -> String {
    let branch = finding.branch_name();
    let title = finding.pr_title();
    let line = finding
        .line
        .map(|l| l.to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    format!(
        r#"Analyze and fix the SonarQube issue with key "{key}" in repository "{repo}".

Issue Details:
- Rule: {rule}
- Severity: {severity}
- Message: {message}
- Component: {component}
- Line: {line}
- Branch: {branch}

Please:
1. Use sonarqube mcp tools to get more details about this specific issue and rule
2. Locate the problematic code in the repository (component: {component})
3. Fix the issue according to SonarQube recommendations
4. Test the fix if applicable (run any existing tests)
5. Commit the changes with message: "{title}"
6. Push the branch: git push origin {branch}
7. Create a pull request using gh CLI with:
   - Title: "{title}"
   - Body: Include what was fixed and how it was fixed, the SonarQube rule details, severity level, and file/line affected
   - Command: gh pr create --title "{title}" --body "[detailed description of fix]" --head {branch}

Make sure to include in the PR body:
- SonarQube issue key and rule
- Severity level
- File and line number affected
- Description of what was wrong
- Description of how it was fixed
- Any testing done"#,
        key = finding.key,
        repo = finding.repository,
        rule = finding.rule,
        severity = finding.severity,
        message = finding.message,
        component = finding.component,
    )
}

/// Asks the assistant to list open findings through its static-analysis tools.
pub fn fetch_prompt(project: &str) -> String {
    format!(
        r#"Use mcp__sonarqube__search_sonar_issues_in_projects tool for project {project}. Return as JSON with this format: {{"issues":[{{"key":"...","rule":"...","project":"...","component":"...","severity":"...","status":"OPEN","message":"...","line":123,"type":"..."}}]}}"#
    )
}

/// Warn-only preflight question.
pub const TOOLS_PROBE_PROMPT: &str = "Please list the available SonarQube MCP tools. I need to verify that mcp__sonarqube__search_my_sonarqube_projects is available.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Severity;

    #[test]
    fn fix_prompt_names_branch_and_title() {
        let finding = Finding {
            key: "X1".to_string(),
            rule: "secrets:S6699".to_string(),
            severity: Severity::Blocker,
            message: "Revoke this key".to_string(),
            component: "org_repo:server/.env".to_string(),
            line: None,
            project: "org_repo".to_string(),
            repository: "org/repo".to_string(),
            issue_type: Some("VULNERABILITY".to_string()),
            status: None,
        };
        let prompt = fix_prompt(&finding);
        assert!(prompt.starts_with(
            "Analyze and fix the SonarQube issue with key \"X1\" in repository \"org/repo\"."
        ));
        assert!(prompt.contains("- Severity: BLOCKER"));
        assert!(prompt.contains("- Line: Unknown"));
        assert!(prompt.contains("git push origin fix/sonar-X1"));
        assert!(prompt.contains("--title \"Fix SonarQube issue X1: Revoke this key\""));
    }

    #[test]
    fn fetch_prompt_embeds_project() {
        let prompt = fetch_prompt("org_repo");
        assert!(prompt.contains("for project org_repo."));
        assert!(prompt.contains(r#"{"issues":[{"key":"...""#));
    }
}
