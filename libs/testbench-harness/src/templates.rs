// Starter programs shown before the user has written anything
use testbench_common::types::Language;

pub fn starter_template(language: Language) -> &'static str {
    match language {
        Language::Cpp => {
            "#include <iostream>\nusing namespace std;\n\nint main() {\n    cout << \"Hello, World!\" << endl;\n    return 0;\n}\n"
        }
        Language::Java => {
            "public class Main {\n    public static void main(String[] args) {\n        System.out.println(\"Hello, World!\");\n    }\n}\n"
        }
        Language::Python => "print(\"Hello, World!\")\n",
        Language::JavaScript | Language::TypeScript => "console.log(\"Hello, World!\");\n",
        Language::C => {
            "#include <stdio.h>\n\nint main() {\n    printf(\"Hello, World!\\n\");\n    return 0;\n}\n"
        }
        Language::CSharp => {
            "using System;\n\nclass Program {\n    static void Main(string[] args) {\n        Console.WriteLine(\"Hello, World!\");\n    }\n}\n"
        }
        Language::Go => {
            "package main\n\nimport \"fmt\"\n\nfunc main() {\n    fmt.Println(\"Hello, World!\")\n}\n"
        }
        Language::Rust => "fn main() {\n    println!(\"Hello, World!\");\n}\n",
        Language::Php => "<?php\necho \"Hello, World!\\n\";\n?>\n",
        Language::Ruby => "puts \"Hello, World!\"\n",
        Language::Swift => "import Foundation\n\nprint(\"Hello, World!\")\n",
        Language::Kotlin => "fun main() {\n    println(\"Hello, World!\")\n}\n",
        Language::Scala => "object Main extends App {\n    println(\"Hello, World!\")\n}\n",
    }
}
